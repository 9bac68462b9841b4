//! Capability descriptors.
//!
//! A descriptor tells the framework which channels and attributes a device exposes and how to
//! reach them. It is built once when the device is created and never changes afterwards. The
//! attribute entries carry plain function pointers back into the device type, so dispatch never
//! needs to downcast an opaque handle.

use core::fmt;

use serde::Serialize;

use crate::error::Result;

/// Data direction of a channel, seen from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelDirection {
    /// Device produces samples (ADC-like).
    Input,
    /// Device consumes samples (DAC-like).
    Output,
}

impl ChannelDirection {
    pub fn is_output(self) -> bool {
        matches!(self, ChannelDirection::Output)
    }
}

/// Channel context handed to channel attribute accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub index: u16,
    pub direction: ChannelDirection,
}

/// Renders an attribute into `buf`, returning the number of bytes written.
pub type ShowFn<D> = fn(&D, &mut [u8], Option<&ChannelInfo>) -> Result<usize>;

/// Parses `buf` into the attribute, returning the number of bytes consumed.
pub type StoreFn<D> = fn(&mut D, &[u8], Option<&ChannelInfo>) -> Result<usize>;

pub struct AttributeDescriptor<D> {
    pub name: &'static str,
    pub show: ShowFn<D>,
    pub store: StoreFn<D>,
}

// Manual impls: deriving would put a bound on `D` even though only fn pointers are stored.
impl<D> Clone for AttributeDescriptor<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for AttributeDescriptor<D> {}

impl<D> fmt::Debug for AttributeDescriptor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub struct ChannelDescriptor<D> {
    pub name: String,
    pub index: u16,
    pub direction: ChannelDirection,
    pub attributes: Vec<AttributeDescriptor<D>>,
}

impl<D> ChannelDescriptor<D> {
    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            index: self.index,
            direction: self.direction,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor<D>> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

impl<D> Clone for ChannelDescriptor<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index,
            direction: self.direction,
            attributes: self.attributes.clone(),
        }
    }
}

impl<D> fmt::Debug for ChannelDescriptor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDescriptor")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("direction", &self.direction)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Everything the framework needs to expose a device: channels, global attributes, and (through
/// the device's [`crate::TransferOps`] impl) the transfer callbacks.
pub struct DeviceDescriptor<D> {
    pub channels: Vec<ChannelDescriptor<D>>,
    pub attributes: Vec<AttributeDescriptor<D>>,
}

impl<D> DeviceDescriptor<D> {
    pub fn num_channels(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn channel(&self, index: u16) -> Option<&ChannelDescriptor<D>> {
        self.channels.iter().find(|ch| ch.index == index)
    }

    pub fn global_attribute(&self, name: &str) -> Option<&AttributeDescriptor<D>> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Type-erased view of the descriptor, suitable for listing or serializing.
    pub fn summary(&self) -> DescriptorSummary {
        DescriptorSummary {
            channels: self
                .channels
                .iter()
                .map(|ch| ChannelSummary {
                    name: ch.name.clone(),
                    index: ch.index,
                    direction: ch.direction,
                    attributes: ch.attributes.iter().map(|a| a.name).collect(),
                })
                .collect(),
            attributes: self.attributes.iter().map(|a| a.name).collect(),
        }
    }
}

impl<D> Clone for DeviceDescriptor<D> {
    fn clone(&self) -> Self {
        Self {
            channels: self.channels.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<D> fmt::Debug for DeviceDescriptor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("channels", &self.channels)
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub name: String,
    pub index: u16,
    pub direction: ChannelDirection,
    pub attributes: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorSummary {
    pub channels: Vec<ChannelSummary>,
    pub attributes: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: u32,
    }

    fn show_value(dev: &Counter, buf: &mut [u8], _ch: Option<&ChannelInfo>) -> Result<usize> {
        let text = dev.value.to_string();
        buf[..text.len()].copy_from_slice(text.as_bytes());
        Ok(text.len())
    }

    fn store_value(dev: &mut Counter, buf: &[u8], _ch: Option<&ChannelInfo>) -> Result<usize> {
        dev.value = buf.len() as u32;
        Ok(buf.len())
    }

    fn counter_descriptor() -> DeviceDescriptor<Counter> {
        let attr = AttributeDescriptor {
            name: "value",
            show: show_value,
            store: store_value,
        };
        DeviceDescriptor {
            channels: vec![ChannelDescriptor {
                name: "voltage0".into(),
                index: 0,
                direction: ChannelDirection::Output,
                attributes: vec![attr],
            }],
            attributes: vec![attr],
        }
    }

    #[test]
    fn lookups_resolve_by_name_and_index() {
        let desc = counter_descriptor();
        assert_eq!(desc.num_channels(), 1);
        assert!(desc.global_attribute("value").is_some());
        assert!(desc.global_attribute("missing").is_none());

        let ch = desc.channel(0).expect("channel 0");
        assert_eq!(ch.info().direction, ChannelDirection::Output);
        assert!(ch.attribute("value").is_some());
        assert!(desc.channel(1).is_none());
    }

    #[test]
    fn accessors_reach_the_device() {
        let desc = counter_descriptor();
        let attr = desc.global_attribute("value").unwrap();
        let mut dev = Counter { value: 0 };

        assert_eq!((attr.store)(&mut dev, b"abc", None), Ok(3));
        let mut buf = [0u8; 8];
        let n = (attr.show)(&dev, &mut buf, None).unwrap();
        assert_eq!(&buf[..n], b"3");
    }

    #[test]
    fn summary_serializes_direction_in_lowercase() {
        let summary = counter_descriptor().summary();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["channels"][0]["direction"], "output");
        assert_eq!(json["channels"][0]["name"], "voltage0");
        assert_eq!(json["attributes"][0], "value");
    }
}
