use core::fmt;

use crate::descriptor::DescriptorSummary;
use crate::device::RegisteredDevice;
use crate::error::{IioError, Result};

/// Default upper bound on simultaneously registered devices.
pub const DEFAULT_MAX_DEVICES: usize = 32;

/// Handle naming one registry entry.
///
/// The generation changes every time a slot is reused, so an id kept past `unregister` never
/// resolves to whichever device later takes the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    index: u32,
    generation: u32,
}

impl EntryId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// The registration boundary a device driver consumes.
pub trait Registry {
    fn register(&mut self, name: &str, device: Box<dyn RegisteredDevice>) -> Result<EntryId>;

    /// Remove an entry and hand its device back to the caller.
    fn unregister(&mut self, id: EntryId) -> Result<Box<dyn RegisteredDevice>>;
}

struct Entry {
    name: String,
    device: Box<dyn RegisteredDevice>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// In-process device registry.
///
/// Devices are dispatched by [`EntryId`]. Every dispatch borrows exactly one entry mutably, so
/// calls into a device are serialized by construction.
pub struct IioRegistry {
    slots: Vec<Slot>,
    /// Live ids in registration order.
    order: Vec<EntryId>,
    capacity: usize,
}

impl IioRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_DEVICES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            order: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entry(id).is_some()
    }

    pub fn find(&self, name: &str) -> Option<EntryId> {
        self.order
            .iter()
            .copied()
            .find(|&id| self.entry(id).is_some_and(|e| e.name == name))
    }

    /// Names of the live devices, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|&id| self.entry(id))
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn name(&self, id: EntryId) -> Result<&str> {
        self.entry(id)
            .map(|e| e.name.as_str())
            .ok_or(IioError::NoDevice(id))
    }

    pub fn descriptor(&self, id: EntryId) -> Result<DescriptorSummary> {
        Ok(self.device(id)?.summary())
    }

    pub fn device(&self, id: EntryId) -> Result<&dyn RegisteredDevice> {
        self.entry(id)
            .map(|e| e.device.as_ref())
            .ok_or(IioError::NoDevice(id))
    }

    pub fn device_mut(&mut self, id: EntryId) -> Result<&mut dyn RegisteredDevice> {
        match self.slot_mut(id).and_then(|slot| slot.entry.as_mut()) {
            Some(entry) => {
                let device: &mut dyn RegisteredDevice = entry.device.as_mut();
                Ok(device)
            }
            None => Err(IioError::NoDevice(id)),
        }
    }

    pub fn show_attr(
        &self,
        id: EntryId,
        attr: &str,
        channel: Option<u16>,
        buf: &mut [u8],
    ) -> Result<usize> {
        self.device(id)?.show_attr(attr, channel, buf)
    }

    pub fn store_attr(
        &mut self,
        id: EntryId,
        attr: &str,
        channel: Option<u16>,
        buf: &[u8],
    ) -> Result<usize> {
        self.device_mut(id)?.store_attr(attr, channel, buf)
    }

    pub fn transfer_mem_to_dev(
        &mut self,
        id: EntryId,
        bytes_count: usize,
        ch_mask: u32,
    ) -> Result<usize> {
        self.device_mut(id)?
            .transfer()
            .transfer_mem_to_dev(bytes_count, ch_mask)
    }

    pub fn transfer_dev_to_mem(
        &mut self,
        id: EntryId,
        bytes_count: usize,
        ch_mask: u32,
    ) -> Result<usize> {
        self.device_mut(id)?
            .transfer()
            .transfer_dev_to_mem(bytes_count, ch_mask)
    }

    pub fn read_data(
        &mut self,
        id: EntryId,
        buf: &mut [u8],
        offset: usize,
        bytes_count: usize,
        ch_mask: u32,
    ) -> Result<usize> {
        self.device_mut(id)?
            .transfer()
            .read_data(buf, offset, bytes_count, ch_mask)
    }

    pub fn write_data(
        &mut self,
        id: EntryId,
        buf: &[u8],
        offset: usize,
        bytes_count: usize,
        ch_mask: u32,
    ) -> Result<usize> {
        self.device_mut(id)?
            .transfer()
            .write_data(buf, offset, bytes_count, ch_mask)
    }

    fn entry(&self, id: EntryId) -> Option<&Entry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn slot_mut(&mut self, id: EntryId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }
}

impl Default for IioRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for IioRegistry {
    fn register(&mut self, name: &str, device: Box<dyn RegisteredDevice>) -> Result<EntryId> {
        if name.is_empty() {
            return Err(IioError::InvalidArgument("device name must not be empty"));
        }
        if self.find(name).is_some() {
            return Err(IioError::AlreadyRegistered(name.to_owned()));
        }
        if self.len() >= self.capacity {
            return Err(IioError::RegistryFull {
                capacity: self.capacity,
            });
        }

        let entry = Entry {
            name: name.to_owned(),
            device,
        };
        let id = match self.slots.iter().position(|slot| slot.entry.is_none()) {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.entry = Some(entry);
                EntryId::new(index as u32, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                EntryId::new(index, 0)
            }
        };
        self.order.push(id);

        tracing::debug!(device = name, %id, "registered device");
        Ok(id)
    }

    fn unregister(&mut self, id: EntryId) -> Result<Box<dyn RegisteredDevice>> {
        let slot = self.slot_mut(id).ok_or(IioError::NoDevice(id))?;
        let entry = slot.entry.take().ok_or(IioError::NoDevice(id))?;
        // Retire the generation so `id` can never resolve again.
        slot.generation = slot.generation.wrapping_add(1);
        self.order.retain(|&live| live != id);

        tracing::debug!(device = %entry.name, %id, "unregistered device");
        Ok(entry.device)
    }
}
