use thiserror::Error;

use crate::registry::EntryId;

pub type Result<T> = std::result::Result<T, IioError>;

/// Generic failure code used when no more specific errno applies.
pub const FAILURE: i32 = -1;
pub const ENOMEM: i32 = -12;
pub const ENODEV: i32 = -19;
pub const EINVAL: i32 = -22;

/// Errors returned by the device registry and by device callbacks.
///
/// Callers that sit on a C-like transport only see the sign of the status; use
/// [`IioError::errno`] (or [`crate::status::from_result`]) to fold an error into that model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IioError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("no such device: {0}")]
    NoDevice(EntryId),

    #[error("no such attribute `{0}`")]
    UnknownAttribute(String),

    #[error("no such channel {index} (device has {num_channels})")]
    UnknownChannel { index: u16, num_channels: u16 },

    /// A caller buffer was absent or shorter than the byte count it was paired with.
    #[error("buffer too small: need {needed} bytes, got {len}")]
    BufferTooSmall { needed: usize, len: usize },

    #[error("device name `{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("registry is full ({capacity} devices)")]
    RegistryFull { capacity: usize },

    #[error("failed to allocate {bytes} bytes of device memory")]
    OutOfMemory { bytes: usize },
}

impl IioError {
    /// Negative status code for this error.
    pub fn errno(&self) -> i32 {
        match self {
            IioError::InvalidArgument(_)
            | IioError::UnknownAttribute(_)
            | IioError::UnknownChannel { .. }
            | IioError::BufferTooSmall { .. } => EINVAL,
            IioError::NoDevice(_) => ENODEV,
            IioError::OutOfMemory { .. } => ENOMEM,
            IioError::AlreadyRegistered(_) | IioError::RegistryFull { .. } => FAILURE,
        }
    }
}
