//! Moving samples between host buffers and device memory.
//!
//! Samples are 16-bit little-endian. On the device every one of the `num_channels` channels is
//! interleaved in round-robin order (`ch0, ch1, .., chN-1, ch0, ..`). A host read names the
//! channels it wants with a bitmask (bit `i` = channel `i`) and receives only those samples,
//! still interleaved among themselves.
//!
//! The two directions are not symmetric:
//! - [`read_samples`] de-interleaves according to the mask.
//! - [`write_samples`] ignores the mask and stores the host buffer verbatim at `offset`. A host
//!   that writes a subset of channels must interleave the full frame itself.

use iio_framework::{IioError, Result};

use crate::ddr::DeviceMemory;

/// Size of one sample in bytes.
pub const SAMPLE_BYTES: usize = 2;

/// Packs two consecutive 16-bit samples into the 32-bit word stored on the device.
///
/// The first sample occupies the low half, so the little-endian byte image of the word is the
/// two samples back to back.
#[inline]
pub fn pack_sample_pair(first: u16, second: u16) -> u32 {
    (u32::from(second) << 16) | u32::from(first)
}

#[inline]
fn host_sample(buf: &[u8], index: usize) -> u16 {
    let at = index * SAMPLE_BYTES;
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

/// Number of channels enabled in `ch_mask`.
///
/// Every set bit counts, including bits at or above the device's channel count. Such bits scale
/// the transfer span like any other but never match a channel during the walk.
pub fn enabled_channels(ch_mask: u32) -> Result<u32> {
    if ch_mask == 0 {
        return Err(IioError::InvalidArgument("channel mask selects no channels"));
    }
    Ok(ch_mask.count_ones())
}

/// Store `bytes_count` bytes of host samples into device memory at byte `offset`.
///
/// Samples are taken in pairs and written as one packed 32-bit word per pair; a trailing unpaired
/// sample is written on its own.
pub fn write_samples(
    mem: &mut DeviceMemory,
    host: &[u8],
    offset: usize,
    bytes_count: usize,
) -> Result<usize> {
    if bytes_count % SAMPLE_BYTES != 0 {
        return Err(IioError::InvalidArgument(
            "byte count must be a whole number of samples",
        ));
    }
    if host.len() < bytes_count {
        return Err(IioError::BufferTooSmall {
            needed: bytes_count,
            len: host.len(),
        });
    }

    let samples = bytes_count / SAMPLE_BYTES;
    let mut index = 0;
    while index + 1 < samples {
        let word = pack_sample_pair(host_sample(host, index), host_sample(host, index + 1));
        mem.write_u32_le(offset.wrapping_add(index * SAMPLE_BYTES), word);
        index += 2;
    }
    if index < samples {
        mem.write_u16_le(
            offset.wrapping_add(index * SAMPLE_BYTES),
            host_sample(host, index),
        );
    }

    Ok(bytes_count)
}

/// Fill `out` with `bytes_count` bytes of the channels selected by `ch_mask`.
///
/// `offset` and `bytes_count` describe the host's view of the (masked) stream. Both are scaled
/// by `num_channels / enabled` to find the span of the full interleaved stream on the device;
/// that span is walked one sample at a time and every sample whose channel is enabled is copied
/// out, in order.
pub fn read_samples(
    mem: &DeviceMemory,
    num_channels: u16,
    out: &mut [u8],
    offset: usize,
    bytes_count: usize,
    ch_mask: u32,
) -> Result<usize> {
    let enabled = enabled_channels(ch_mask)? as usize;
    if out.len() < bytes_count {
        return Err(IioError::BufferTooSmall {
            needed: bytes_count,
            len: out.len(),
        });
    }

    let num_channels = usize::from(num_channels);
    let overflow = || IioError::InvalidArgument("transfer span overflows");
    let steps = bytes_count
        .checked_mul(num_channels)
        .ok_or_else(overflow)?
        / enabled
        / SAMPLE_BYTES;
    let device_offset = offset.checked_mul(num_channels).ok_or_else(overflow)? / enabled;

    let capacity = bytes_count / SAMPLE_BYTES;
    let mut produced = 0;
    let mut channel = 0;
    for step in 0..steps {
        let selected = ch_mask.checked_shr(channel as u32).unwrap_or(0) & 1 != 0;
        if selected && produced < capacity {
            let sample = mem.read_u16_le(device_offset.wrapping_add(step * SAMPLE_BYTES));
            let at = produced * SAMPLE_BYTES;
            out[at..at + SAMPLE_BYTES].copy_from_slice(&sample.to_le_bytes());
            produced += 1;
        }
        channel = if channel + 1 < num_channels {
            channel + 1
        } else {
            0
        };
    }

    Ok(bytes_count)
}
