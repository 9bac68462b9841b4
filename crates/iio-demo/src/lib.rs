//! An emulated industrial-I/O converter for exercising the framework without hardware.
//!
//! A demo device owns:
//! - `num_channels` channels named `voltage0..`, all of one direction;
//! - a global attribute `demo_global_attr` and a channel attribute `demo_channel_attr`, each a
//!   single 32-bit value rendered as decimal text;
//! - a block of emulated device memory that host buffers are copied into and out of.
//!
//! Use [`create`] to build a device from a [`DemoInitParam`] and register it, and [`destroy`] to
//! take it down again.

#![forbid(unsafe_code)]

pub mod attr;
pub mod config;
pub mod ddr;
pub mod device;
pub mod lifecycle;
pub mod transfer;

pub use attr::{AttrKind, AttributeStore, DEMO_CHANNEL_ATTR, DEMO_GLOBAL_ATTR};
pub use config::{ConfigError, DemoInitParam, Direction, MAX_CHANNELS};
pub use ddr::DeviceMemory;
pub use device::DemoDevice;
pub use lifecycle::{create, destroy, DemoHandle, DestroyError};
pub use transfer::SAMPLE_BYTES;
