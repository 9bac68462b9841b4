//! Creating and destroying demo devices against a [`Registry`].

use std::fmt;

use iio_framework::{EntryId, IioError, Registration, Registry, Result};
use thiserror::Error;

use crate::config::DemoInitParam;
use crate::device::DemoDevice;

/// Owner's handle to a registered demo device.
///
/// Not `Clone`: [`destroy`] consumes it, so a device cannot be torn down twice through the same
/// handle.
#[derive(Debug, PartialEq, Eq)]
pub struct DemoHandle {
    id: EntryId,
    name: String,
}

impl DemoHandle {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DemoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Teardown failed; the device is still registered and `handle` still owns it.
#[derive(Debug, Error)]
#[error("failed to destroy {handle}: {source}")]
pub struct DestroyError {
    pub handle: DemoHandle,
    #[source]
    pub source: IioError,
}

impl DestroyError {
    pub fn into_handle(self) -> DemoHandle {
        self.handle
    }
}

/// Build a demo device from `param` and register it.
///
/// Nothing is left behind on failure: the device and its descriptor are dropped before the error
/// is returned.
pub fn create<R: Registry + ?Sized>(registry: &mut R, param: &DemoInitParam) -> Result<DemoHandle> {
    let device = DemoDevice::new(param).map_err(|err| {
        tracing::warn!(name = %param.name, "demo device rejected: {err}");
        err
    })?;
    let descriptor = device.descriptor();
    let num_channels = device.num_channels();
    let registration = Registration::new(device, descriptor);

    let id = registry
        .register(&param.name, Box::new(registration))
        .map_err(|err| {
            tracing::warn!(name = %param.name, "demo device registration failed: {err}");
            err
        })?;

    tracing::debug!(
        name = %param.name,
        %id,
        num_channels,
        ddr_base = format_args!("{:#x}", param.ddr_base_addr),
        ddr_size = param.ddr_base_size,
        "demo device created"
    );
    Ok(DemoHandle {
        id,
        name: param.name.clone(),
    })
}

/// Unregister the device and release it.
///
/// The device is only freed once the registry has let go of it. If unregistering fails, nothing
/// is freed and the handle comes back inside the error.
pub fn destroy<R: Registry + ?Sized>(
    handle: DemoHandle,
    registry: &mut R,
) -> std::result::Result<(), DestroyError> {
    match registry.unregister(handle.id) {
        Ok(device) => {
            drop(device);
            tracing::debug!(name = %handle.name, id = %handle.id, "demo device destroyed");
            Ok(())
        }
        Err(source) => {
            tracing::warn!(
                name = %handle.name,
                id = %handle.id,
                "demo device still registered: {source}"
            );
            Err(DestroyError { handle, source })
        }
    }
}
