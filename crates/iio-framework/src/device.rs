use crate::descriptor::{DescriptorSummary, DeviceDescriptor};
use crate::error::{IioError, Result};

/// Buffer transfer callbacks a device provides to the framework.
///
/// The framework streams a buffer in chunks: for output devices it calls
/// [`TransferOps::write_data`] once per chunk and then [`TransferOps::transfer_mem_to_dev`]; for
/// input devices it calls [`TransferOps::transfer_dev_to_mem`] first and then
/// [`TransferOps::read_data`] once per chunk. Every call returns the number of bytes handled.
pub trait TransferOps {
    /// Push `bytes_count` bytes that were staged in device memory out to the peripheral.
    fn transfer_mem_to_dev(&mut self, bytes_count: usize, ch_mask: u32) -> Result<usize>;

    /// Pull `bytes_count` bytes from the peripheral into device memory.
    fn transfer_dev_to_mem(&mut self, bytes_count: usize, ch_mask: u32) -> Result<usize>;

    /// Copy a chunk out of device memory into `buf`.
    fn read_data(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        bytes_count: usize,
        ch_mask: u32,
    ) -> Result<usize>;

    /// Copy a chunk from `buf` into device memory.
    fn write_data(
        &mut self,
        buf: &[u8],
        offset: usize,
        bytes_count: usize,
        ch_mask: u32,
    ) -> Result<usize>;
}

/// Object-safe view of a registered device, as stored by a [`crate::Registry`].
pub trait RegisteredDevice: Send {
    fn summary(&self) -> DescriptorSummary;

    fn num_channels(&self) -> u16;

    /// Render attribute `attr` into `buf`. `channel` selects a channel attribute; `None` selects
    /// a global one.
    fn show_attr(&self, attr: &str, channel: Option<u16>, buf: &mut [u8]) -> Result<usize>;

    /// Store `buf` into attribute `attr`.
    fn store_attr(&mut self, attr: &str, channel: Option<u16>, buf: &[u8]) -> Result<usize>;

    fn transfer(&mut self) -> &mut dyn TransferOps;
}

/// A device paired with its descriptor.
///
/// This is what a registry entry owns. Fields drop in declaration order, so the descriptor is
/// released before the device instance.
pub struct Registration<D> {
    descriptor: DeviceDescriptor<D>,
    device: D,
}

impl<D> Registration<D> {
    pub fn new(device: D, descriptor: DeviceDescriptor<D>) -> Self {
        Self { descriptor, device }
    }

    fn channel_info(&self, index: u16) -> Result<crate::ChannelInfo> {
        self.descriptor
            .channel(index)
            .map(|ch| ch.info())
            .ok_or(IioError::UnknownChannel {
                index,
                num_channels: self.descriptor.num_channels(),
            })
    }
}

impl<D> RegisteredDevice for Registration<D>
where
    D: TransferOps + Send + 'static,
{
    fn summary(&self) -> DescriptorSummary {
        self.descriptor.summary()
    }

    fn num_channels(&self) -> u16 {
        self.descriptor.num_channels()
    }

    fn show_attr(&self, attr: &str, channel: Option<u16>, buf: &mut [u8]) -> Result<usize> {
        match channel {
            None => {
                let desc = self
                    .descriptor
                    .global_attribute(attr)
                    .ok_or_else(|| IioError::UnknownAttribute(attr.to_owned()))?;
                (desc.show)(&self.device, buf, None)
            }
            Some(index) => {
                let info = self.channel_info(index)?;
                let desc = self
                    .descriptor
                    .channel(index)
                    .and_then(|ch| ch.attribute(attr))
                    .ok_or_else(|| IioError::UnknownAttribute(attr.to_owned()))?;
                (desc.show)(&self.device, buf, Some(&info))
            }
        }
    }

    fn store_attr(&mut self, attr: &str, channel: Option<u16>, buf: &[u8]) -> Result<usize> {
        match channel {
            None => {
                let store = self
                    .descriptor
                    .global_attribute(attr)
                    .map(|desc| desc.store)
                    .ok_or_else(|| IioError::UnknownAttribute(attr.to_owned()))?;
                store(&mut self.device, buf, None)
            }
            Some(index) => {
                let info = self.channel_info(index)?;
                let store = self
                    .descriptor
                    .channel(index)
                    .and_then(|ch| ch.attribute(attr))
                    .map(|desc| desc.store)
                    .ok_or_else(|| IioError::UnknownAttribute(attr.to_owned()))?;
                store(&mut self.device, buf, Some(&info))
            }
        }
    }

    fn transfer(&mut self) -> &mut dyn TransferOps {
        &mut self.device
    }
}
