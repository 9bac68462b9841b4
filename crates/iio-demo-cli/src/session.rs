//! One scripted buffer session against a freshly created demo device.

use anyhow::{bail, Context, Result};
use iio_demo::{create, destroy, DemoInitParam, DEMO_CHANNEL_ATTR, DEMO_GLOBAL_ATTR, SAMPLE_BYTES};
use iio_framework::{DescriptorSummary, EntryId, IioRegistry};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct SessionPlan {
    /// Frames of ramp data to push through the device.
    pub frames: usize,
    /// Channels to read back. `None` reads every channel.
    pub read_mask: Option<u32>,
    pub set_global: Option<String>,
    pub set_channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub device: String,
    pub descriptor: DescriptorSummary,
    pub global_attr: String,
    pub channel_attr: String,
    pub read_mask: u32,
    /// Read-back samples, one row per frame, enabled channels only.
    pub frames: Vec<Vec<u16>>,
}

/// Ramp value for `channel` in `frame`: channel in the top nibble, frame below it.
pub fn ramp_sample(frame: usize, channel: usize) -> u16 {
    ((channel as u16) << 12) | (frame as u16 & 0x0fff)
}

fn ramp(frames: usize, num_channels: usize) -> Vec<u8> {
    (0..frames)
        .flat_map(|frame| (0..num_channels).map(move |channel| ramp_sample(frame, channel)))
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// Create the device, drive it once, and destroy it again.
///
/// The device is destroyed even when the session itself fails.
pub fn run(param: &DemoInitParam, plan: &SessionPlan) -> Result<SessionReport> {
    let mut registry = IioRegistry::new();
    let handle = create(&mut registry, param).context("create demo device")?;
    tracing::info!(device = %handle, "demo device up");

    let report = drive(&mut registry, handle.id(), handle.to_string(), param, plan);

    destroy(handle, &mut registry).context("destroy demo device")?;
    report
}

fn drive(
    registry: &mut IioRegistry,
    id: EntryId,
    device: String,
    param: &DemoInitParam,
    plan: &SessionPlan,
) -> Result<SessionReport> {
    let descriptor = registry.descriptor(id)?;
    let num_channels = descriptor.channels.len();
    let full_mask = u32::MAX >> (32 - num_channels as u32);

    if let Some(text) = &plan.set_global {
        registry
            .store_attr(id, DEMO_GLOBAL_ATTR, None, text.as_bytes())
            .context("store demo_global_attr")?;
    }
    if let Some(text) = &plan.set_channel {
        registry
            .store_attr(id, DEMO_CHANNEL_ATTR, Some(0), text.as_bytes())
            .context("store demo_channel_attr")?;
    }

    let ramp_bytes = plan
        .frames
        .checked_mul(num_channels)
        .and_then(|n| n.checked_mul(SAMPLE_BYTES))
        .filter(|&n| n <= param.ddr_base_size);
    let Some(ramp_bytes) = ramp_bytes else {
        bail!(
            "{} frames of {} channels do not fit in {} bytes of device memory",
            plan.frames,
            num_channels,
            param.ddr_base_size
        );
    };
    let data = ramp(plan.frames, num_channels);
    registry
        .write_data(id, &data, 0, ramp_bytes, full_mask)
        .context("write ramp")?;
    registry.transfer_mem_to_dev(id, ramp_bytes, full_mask)?;
    registry.transfer_dev_to_mem(id, ramp_bytes, full_mask)?;

    let read_mask = plan.read_mask.unwrap_or(full_mask);
    let enabled = read_mask.count_ones() as usize;
    let bytes_count = plan
        .frames
        .checked_mul(enabled)
        .and_then(|n| n.checked_mul(SAMPLE_BYTES))
        .with_context(|| {
            format!("{} frames of channels {read_mask:#b} overflow a read", plan.frames)
        })?;
    let mut out = vec![0u8; bytes_count];
    registry
        .read_data(id, &mut out, 0, bytes_count, read_mask)
        .with_context(|| format!("read back channels {read_mask:#b}"))?;

    let samples: Vec<u16> = out
        .chunks_exact(SAMPLE_BYTES)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();

    Ok(SessionReport {
        device,
        descriptor,
        global_attr: show(registry, id, DEMO_GLOBAL_ATTR, None)?,
        channel_attr: show(registry, id, DEMO_CHANNEL_ATTR, Some(0))?,
        read_mask,
        frames: samples.chunks(enabled).map(<[u16]>::to_vec).collect(),
    })
}

fn show(registry: &IioRegistry, id: EntryId, attr: &str, channel: Option<u16>) -> Result<String> {
    let mut buf = [0u8; 16];
    let n = registry
        .show_attr(id, attr, channel, &mut buf)
        .with_context(|| format!("show {attr}"))?;
    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}
