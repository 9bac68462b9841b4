use iio_framework::{
    AttributeDescriptor, ChannelDescriptor, ChannelDirection, ChannelInfo, DeviceDescriptor,
    Result, TransferOps,
};

use crate::attr::{AttrKind, AttributeStore, DEMO_CHANNEL_ATTR, DEMO_GLOBAL_ATTR};
use crate::config::DemoInitParam;
use crate::ddr::DeviceMemory;
use crate::transfer;

/// A virtual converter: attribute state plus a block of device memory.
#[derive(Debug)]
pub struct DemoDevice {
    name: String,
    num_channels: u16,
    direction: ChannelDirection,
    attrs: AttributeStore,
    memory: DeviceMemory,
}

impl DemoDevice {
    pub fn new(param: &DemoInitParam) -> Result<Self> {
        param.validate()?;
        Ok(Self {
            name: param.name.clone(),
            num_channels: param.num_channels,
            direction: param.direction.into(),
            attrs: AttributeStore::new(param.dev_global_attr, param.dev_ch_attr),
            memory: DeviceMemory::new(param.ddr_base_addr, param.ddr_base_size)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    pub fn direction(&self) -> ChannelDirection {
        self.direction
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attrs
    }

    pub fn memory(&self) -> &DeviceMemory {
        &self.memory
    }

    /// All-channels mask for this device.
    pub fn full_mask(&self) -> u32 {
        u32::MAX >> (32 - u32::from(self.num_channels))
    }

    /// Descriptor advertising `voltage0..voltageN` and the two demo attributes.
    pub fn descriptor(&self) -> DeviceDescriptor<DemoDevice> {
        let channel_attr = AttributeDescriptor {
            name: DEMO_CHANNEL_ATTR,
            show: show_channel_attr,
            store: store_channel_attr,
        };
        let global_attr = AttributeDescriptor {
            name: DEMO_GLOBAL_ATTR,
            show: show_global_attr,
            store: store_global_attr,
        };

        DeviceDescriptor {
            channels: (0..self.num_channels)
                .map(|index| ChannelDescriptor {
                    name: format!("voltage{index}"),
                    index,
                    direction: self.direction,
                    attributes: vec![channel_attr],
                })
                .collect(),
            attributes: vec![global_attr],
        }
    }
}

fn show_channel_attr(
    dev: &DemoDevice,
    buf: &mut [u8],
    _ch: Option<&ChannelInfo>,
) -> Result<usize> {
    dev.attrs.show(AttrKind::Channel, buf)
}

fn store_channel_attr(
    dev: &mut DemoDevice,
    buf: &[u8],
    _ch: Option<&ChannelInfo>,
) -> Result<usize> {
    dev.attrs.store(AttrKind::Channel, buf)
}

fn show_global_attr(
    dev: &DemoDevice,
    buf: &mut [u8],
    _ch: Option<&ChannelInfo>,
) -> Result<usize> {
    dev.attrs.show(AttrKind::Global, buf)
}

fn store_global_attr(
    dev: &mut DemoDevice,
    buf: &[u8],
    _ch: Option<&ChannelInfo>,
) -> Result<usize> {
    dev.attrs.store(AttrKind::Global, buf)
}

impl TransferOps for DemoDevice {
    // There is no converter behind the memory, so both bursts are no-ops. A real driver would
    // start its DMA here.
    fn transfer_mem_to_dev(&mut self, bytes_count: usize, ch_mask: u32) -> Result<usize> {
        tracing::trace!(device = %self.name, bytes_count, ch_mask, "transfer_mem_to_dev");
        Ok(bytes_count)
    }

    fn transfer_dev_to_mem(&mut self, bytes_count: usize, ch_mask: u32) -> Result<usize> {
        tracing::trace!(device = %self.name, bytes_count, ch_mask, "transfer_dev_to_mem");
        Ok(bytes_count)
    }

    fn read_data(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        bytes_count: usize,
        ch_mask: u32,
    ) -> Result<usize> {
        tracing::trace!(
            device = %self.name,
            addr = format_args!("{:#x}", self.memory.physical_addr(offset)),
            offset,
            bytes_count,
            ch_mask,
            "read_data"
        );
        transfer::read_samples(
            &self.memory,
            self.num_channels,
            buf,
            offset,
            bytes_count,
            ch_mask,
        )
        .map_err(|err| {
            tracing::warn!(device = %self.name, "read_data rejected: {err}");
            err
        })
    }

    /// `ch_mask` is not consulted; see [`crate::transfer`].
    fn write_data(
        &mut self,
        buf: &[u8],
        offset: usize,
        bytes_count: usize,
        ch_mask: u32,
    ) -> Result<usize> {
        tracing::trace!(
            device = %self.name,
            addr = format_args!("{:#x}", self.memory.physical_addr(offset)),
            offset,
            bytes_count,
            ch_mask,
            "write_data"
        );
        transfer::write_samples(&mut self.memory, buf, offset, bytes_count).map_err(|err| {
            tracing::warn!(device = %self.name, "write_data rejected: {err}");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use iio_framework::IioError;

    use super::*;
    use crate::config::Direction;

    fn device(num_channels: u16) -> DemoDevice {
        DemoDevice::new(&DemoInitParam {
            num_channels,
            dev_global_attr: 5,
            dev_ch_attr: 6,
            ddr_base_size: 64,
            ..DemoInitParam::default()
        })
        .unwrap()
    }

    #[test]
    fn descriptor_lists_one_voltage_channel_per_index() {
        let dev = device(3);
        let desc = dev.descriptor();
        let names: Vec<_> = desc.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["voltage0", "voltage1", "voltage2"]);
        assert!(desc
            .channels
            .iter()
            .all(|c| c.direction == ChannelDirection::Input));
        assert!(desc.channel(2).unwrap().attribute(DEMO_CHANNEL_ATTR).is_some());
        assert!(desc.global_attribute(DEMO_GLOBAL_ATTR).is_some());
        assert!(desc.global_attribute(DEMO_CHANNEL_ATTR).is_none());
    }

    #[test]
    fn output_devices_advertise_output_channels() {
        let dev = DemoDevice::new(&DemoInitParam {
            direction: Direction::Output,
            ..DemoInitParam::default()
        })
        .unwrap();
        assert!(dev.descriptor().channels.iter().all(|c| c.direction.is_output()));
    }

    #[test]
    fn descriptor_accessors_reach_attribute_slots() {
        let mut dev = device(2);
        let desc = dev.descriptor();
        let global = desc.global_attribute(DEMO_GLOBAL_ATTR).unwrap();
        let channel = desc.channel(1).unwrap().attribute(DEMO_CHANNEL_ATTR).unwrap();

        let mut buf = [0u8; 16];
        let n = (global.show)(&dev, &mut buf, None).unwrap();
        assert_eq!(&buf[..n], b"5");

        assert_eq!((channel.store)(&mut dev, b"77", None), Ok(2));
        assert_eq!(dev.attributes().get(AttrKind::Channel), 77);
        assert_eq!(dev.attributes().get(AttrKind::Global), 5);
    }

    #[test]
    fn bulk_hooks_pass_byte_count_through() {
        let mut dev = device(4);
        assert_eq!(dev.transfer_dev_to_mem(4096, 0b1), Ok(4096));
        assert_eq!(dev.transfer_mem_to_dev(0, 0), Ok(0));
    }

    #[test]
    fn write_ignores_the_channel_mask() {
        let mut a = device(4);
        let mut b = device(4);
        let host = [1u8, 2, 3, 4, 5, 6, 7, 8];
        a.write_data(&host, 0, 8, 0b0001).unwrap();
        b.write_data(&host, 0, 8, 0b1111).unwrap();
        assert_eq!(a.memory().as_bytes(), b.memory().as_bytes());
    }

    #[test]
    fn full_mask_covers_every_channel() {
        assert_eq!(device(1).full_mask(), 0b1);
        assert_eq!(device(4).full_mask(), 0b1111);
        assert_eq!(device(32).full_mask(), u32::MAX);
    }

    #[test]
    fn invalid_params_fail_construction() {
        let err = DemoDevice::new(&DemoInitParam {
            ddr_base_size: 3,
            ..DemoInitParam::default()
        })
        .unwrap_err();
        assert!(matches!(err, IioError::InvalidArgument(_)));
    }
}
