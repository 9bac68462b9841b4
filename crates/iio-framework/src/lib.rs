//! Minimal device framework boundary.
//!
//! This crate holds the pieces a device driver consumes from (and exposes to) a device-management
//! framework: the [`Registry`] it registers with, the [`DeviceDescriptor`] it advertises, and the
//! [`TransferOps`] callbacks the framework drives while streaming buffers. It knows
//! nothing about any particular device.

#![forbid(unsafe_code)]

pub mod descriptor;
pub mod device;
pub mod error;
pub mod registry;
pub mod shared;
pub mod status;

pub use descriptor::{
    AttributeDescriptor, ChannelDescriptor, ChannelDirection, ChannelInfo, ChannelSummary,
    DescriptorSummary, DeviceDescriptor, ShowFn, StoreFn,
};
pub use device::{RegisteredDevice, Registration, TransferOps};
pub use error::{IioError, Result};
pub use registry::{EntryId, IioRegistry, Registry, DEFAULT_MAX_DEVICES};
pub use shared::SharedRegistry;
