use iio_framework::{ChannelDirection, IioError};
use serde::Deserialize;
use thiserror::Error;

use crate::transfer::SAMPLE_BYTES;

/// Largest channel count a 32-bit channel mask can address.
pub const MAX_CHANNELS: u16 = 32;

pub const DEFAULT_NAME: &str = "demo_device";
pub const DEFAULT_NUM_CHANNELS: u16 = 4;
pub const DEFAULT_DDR_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl From<Direction> for ChannelDirection {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Input => ChannelDirection::Input,
            Direction::Output => ChannelDirection::Output,
        }
    }
}

/// Creation parameters for a demo device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoInitParam {
    pub name: String,
    pub num_channels: u16,
    /// Initial value of `demo_global_attr`.
    pub dev_global_attr: u32,
    /// Initial value of `demo_channel_attr`.
    pub dev_ch_attr: u32,
    pub ddr_base_addr: u64,
    pub ddr_base_size: usize,
    pub direction: Direction,
}

impl Default for DemoInitParam {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            num_channels: DEFAULT_NUM_CHANNELS,
            dev_global_attr: 0,
            dev_ch_attr: 0,
            ddr_base_addr: 0,
            ddr_base_size: DEFAULT_DDR_SIZE,
            direction: Direction::Input,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {0}")]
    InvalidEnv(&'static str),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

impl DemoInitParam {
    /// Defaults overridden by `IIO_DEMO_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`DemoInitParam::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut param = Self::default();

        if let Some(name) = lookup("IIO_DEMO_NAME") {
            param.name = name;
        }
        if let Some(raw) = lookup("IIO_DEMO_CHANNELS") {
            param.num_channels = parse_env("IIO_DEMO_CHANNELS", &raw)?;
        }
        if let Some(raw) = lookup("IIO_DEMO_GLOBAL_ATTR") {
            param.dev_global_attr = parse_env("IIO_DEMO_GLOBAL_ATTR", &raw)?;
        }
        if let Some(raw) = lookup("IIO_DEMO_CHANNEL_ATTR") {
            param.dev_ch_attr = parse_env("IIO_DEMO_CHANNEL_ATTR", &raw)?;
        }
        if let Some(raw) = lookup("IIO_DEMO_DDR_BASE") {
            param.ddr_base_addr = parse_u64_env("IIO_DEMO_DDR_BASE", &raw)?;
        }
        if let Some(raw) = lookup("IIO_DEMO_DDR_SIZE") {
            param.ddr_base_size = parse_env("IIO_DEMO_DDR_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("IIO_DEMO_DIRECTION") {
            param.direction = match raw.trim() {
                "input" | "in" => Direction::Input,
                "output" | "out" => Direction::Output,
                _ => return Err(ConfigError::InvalidEnv("IIO_DEMO_DIRECTION")),
            };
        }

        Ok(param)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check the parameters a device can actually be built from.
    pub fn validate(&self) -> Result<(), IioError> {
        if self.name.is_empty() {
            return Err(IioError::InvalidArgument("device name must not be empty"));
        }
        if self.num_channels == 0 || self.num_channels > MAX_CHANNELS {
            return Err(IioError::InvalidArgument(
                "channel count must be between 1 and 32",
            ));
        }
        if self.ddr_base_size == 0 || self.ddr_base_size % SAMPLE_BYTES != 0 {
            return Err(IioError::InvalidArgument(
                "device memory size must be a non-zero multiple of the sample size",
            ));
        }
        if self
            .ddr_base_addr
            .checked_add(self.ddr_base_size as u64)
            .is_none()
        {
            return Err(IioError::InvalidArgument(
                "device memory wraps the address space",
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv(var))
}

/// Accepts decimal or `0x`-prefixed hex, since bus addresses are usually written in hex.
fn parse_u64_env(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|_| ConfigError::InvalidEnv(var))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let param = DemoInitParam::default();
        assert_eq!(param.name, "demo_device");
        assert_eq!(param.num_channels, 4);
        assert!(param.validate().is_ok());
    }

    #[test]
    fn env_overrides_defaults() {
        let param = DemoInitParam::from_lookup(lookup_from(&[
            ("IIO_DEMO_NAME", "adc0"),
            ("IIO_DEMO_CHANNELS", "8"),
            ("IIO_DEMO_GLOBAL_ATTR", "1000"),
            ("IIO_DEMO_CHANNEL_ATTR", " 7 "),
            ("IIO_DEMO_DDR_BASE", "0x8000"),
            ("IIO_DEMO_DDR_SIZE", "4096"),
            ("IIO_DEMO_DIRECTION", "output"),
        ]))
        .unwrap();

        assert_eq!(param.name, "adc0");
        assert_eq!(param.num_channels, 8);
        assert_eq!(param.dev_global_attr, 1000);
        assert_eq!(param.dev_ch_attr, 7);
        assert_eq!(param.ddr_base_addr, 0x8000);
        assert_eq!(param.ddr_base_size, 4096);
        assert_eq!(param.direction, Direction::Output);
    }

    #[test]
    fn bad_env_names_the_variable() {
        let err = DemoInitParam::from_lookup(lookup_from(&[("IIO_DEMO_CHANNELS", "four")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv("IIO_DEMO_CHANNELS")));

        let err = DemoInitParam::from_lookup(lookup_from(&[("IIO_DEMO_DIRECTION", "sideways")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid value for env var IIO_DEMO_DIRECTION");
    }

    #[test]
    fn json_fills_missing_fields_from_defaults() {
        let param =
            DemoInitParam::from_json(r#"{ "name": "dac0", "direction": "output" }"#).unwrap();
        assert_eq!(param.name, "dac0");
        assert_eq!(param.direction, Direction::Output);
        assert_eq!(param.ddr_base_size, DEFAULT_DDR_SIZE);

        assert!(DemoInitParam::from_json(r#"{ "channels": 2 }"#).is_err());
    }

    #[test]
    fn validation_rejects_unusable_layouts() {
        let base = DemoInitParam::default();

        let odd = DemoInitParam {
            ddr_base_size: 1023,
            ..base.clone()
        };
        assert!(odd.validate().is_err());

        let no_channels = DemoInitParam {
            num_channels: 0,
            ..base.clone()
        };
        assert!(no_channels.validate().is_err());

        let too_many = DemoInitParam {
            num_channels: 33,
            ..base.clone()
        };
        assert!(too_many.validate().is_err());

        let wraps = DemoInitParam {
            ddr_base_addr: u64::MAX - 8,
            ..base
        };
        assert!(wraps.validate().is_err());
    }
}
