//! Device attributes, exposed as unsigned decimal text.

use iio_framework::{IioError, Result};

pub const DEMO_GLOBAL_ATTR: &str = "demo_global_attr";
pub const DEMO_CHANNEL_ATTR: &str = "demo_channel_attr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// Device-wide value.
    Global,
    /// Single value shared by every channel of the device.
    Channel,
}

/// The two 32-bit attribute slots of a demo device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeStore {
    global: u32,
    channel: u32,
}

impl AttributeStore {
    pub fn new(global: u32, channel: u32) -> Self {
        Self { global, channel }
    }

    pub fn get(&self, kind: AttrKind) -> u32 {
        match kind {
            AttrKind::Global => self.global,
            AttrKind::Channel => self.channel,
        }
    }

    pub fn set(&mut self, kind: AttrKind, value: u32) {
        match kind {
            AttrKind::Global => self.global = value,
            AttrKind::Channel => self.channel = value,
        }
    }

    /// Render the attribute into `buf`, returning the number of bytes written.
    pub fn show(&self, kind: AttrKind, buf: &mut [u8]) -> Result<usize> {
        format_u32(self.get(kind), buf)
    }

    /// Parse `text` into the attribute.
    ///
    /// Returns `text.len()` no matter how many bytes actually formed the number, so callers see
    /// the whole write as consumed. Use [`parse_u32_prefix`] for the parsed length.
    pub fn store(&mut self, kind: AttrKind, text: &[u8]) -> Result<usize> {
        let (value, _) = parse_u32_prefix(text);
        self.set(kind, value);
        Ok(text.len())
    }
}

/// Write `value` as decimal ASCII into `buf`.
///
/// No terminator is written. Fails without touching `buf` if the digits do not fit.
pub fn format_u32(value: u32, buf: &mut [u8]) -> Result<usize> {
    let text = value.to_string();
    let len = buf.len();
    let out = buf
        .get_mut(..text.len())
        .ok_or(IioError::BufferTooSmall {
            needed: text.len(),
            len,
        })?;
    out.copy_from_slice(text.as_bytes());
    Ok(text.len())
}

/// Parse the leading decimal number of `text`, `strtoul` style.
///
/// Leading ASCII whitespace and a single `+` are skipped, parsing stops at the first non-digit,
/// and values past `u32::MAX` saturate. Text without digits parses as 0. Returns the value and
/// the number of bytes up to the end of the digits (0 when there were none).
pub fn parse_u32_prefix(text: &[u8]) -> (u32, usize) {
    let mut pos = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    if text.get(pos) == Some(&b'+') {
        pos += 1;
    }

    let digits = text[pos..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return (0, 0);
    }

    let value = text[pos..pos + digits].iter().fold(0u32, |acc, &d| {
        acc.saturating_mul(10).saturating_add(u32::from(d - b'0'))
    });
    (value, pos + digits)
}
