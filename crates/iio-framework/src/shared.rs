use std::sync::{Arc, Mutex, PoisonError};

use crate::device::RegisteredDevice;
use crate::error::Result;
use crate::registry::{EntryId, IioRegistry, Registry};

/// A registry that can be driven from several threads.
///
/// Devices themselves do no locking. Every call taken through [`SharedRegistry::with`] holds the
/// registry lock for its whole duration, which serializes the attribute and transfer surface of
/// every device behind it.
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<IioRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: IioRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut IioRegistry) -> R) -> R {
        // A panic inside a device callback leaves the registry structurally intact.
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Registry for SharedRegistry {
    fn register(&mut self, name: &str, device: Box<dyn RegisteredDevice>) -> Result<EntryId> {
        self.with(|reg| reg.register(name, device))
    }

    fn unregister(&mut self, id: EntryId) -> Result<Box<dyn RegisteredDevice>> {
        self.with(|reg| reg.unregister(id))
    }
}
