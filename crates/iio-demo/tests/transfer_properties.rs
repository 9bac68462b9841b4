#![cfg(not(target_arch = "wasm32"))]

use iio_demo::{create, DemoInitParam, DEMO_CHANNEL_ATTR, DEMO_GLOBAL_ATTR};
use iio_framework::{EntryId, IioRegistry};
use proptest::prelude::*;

fn registry_with(num_channels: u16, ddr_base_size: usize) -> (IioRegistry, EntryId) {
    let mut registry = IioRegistry::new();
    let handle = create(
        &mut registry,
        &DemoInitParam {
            num_channels,
            ddr_base_size,
            ..DemoInitParam::default()
        },
    )
    .unwrap();
    (registry, handle.id())
}

fn le_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn attributes_round_trip_through_text(global in any::<u32>(), channel in any::<u32>(), index in 0u16..4) {
        let (mut registry, id) = registry_with(4, 64);

        let text = global.to_string();
        prop_assert_eq!(registry.store_attr(id, DEMO_GLOBAL_ATTR, None, text.as_bytes()), Ok(text.len()));
        let text = format!("{channel}\n");
        prop_assert_eq!(registry.store_attr(id, DEMO_CHANNEL_ATTR, Some(index), text.as_bytes()), Ok(text.len()));

        let mut buf = [0u8; 16];
        let want = global.to_string();
        let n = registry.show_attr(id, DEMO_GLOBAL_ATTR, None, &mut buf).unwrap();
        prop_assert_eq!(&buf[..n], want.as_bytes());

        // The channel attribute is one value shared by every channel.
        let other = (index + 1) % 4;
        let want = channel.to_string();
        let n = registry.show_attr(id, DEMO_CHANNEL_ATTR, Some(other), &mut buf).unwrap();
        prop_assert_eq!(&buf[..n], want.as_bytes());
    }

    #[test]
    fn full_mask_read_returns_what_was_written(
        num_channels in 1u16..=8,
        samples in proptest::collection::vec(any::<u16>(), 0..128),
    ) {
        let (mut registry, id) = registry_with(num_channels, 256);
        let host = le_bytes(&samples);
        let mask = u32::MAX >> (32 - u32::from(num_channels));

        prop_assert_eq!(registry.write_data(id, &host, 0, host.len(), mask), Ok(host.len()));
        let mut out = vec![0u8; host.len()];
        prop_assert_eq!(registry.read_data(id, &mut out, 0, host.len(), mask), Ok(host.len()));
        prop_assert_eq!(out, host);
    }

    #[test]
    fn masked_read_keeps_only_enabled_channels(
        num_channels in 1u16..=8,
        mask_seed in any::<u32>(),
        frames in 1usize..16,
        seed in any::<u16>(),
    ) {
        let full = u32::MAX >> (32 - u32::from(num_channels));
        let ch_mask = (mask_seed & full).max(1);
        let n = usize::from(num_channels);
        let samples: Vec<u16> = (0..frames * n)
            .map(|i| seed.wrapping_add(i as u16))
            .collect();

        let (mut registry, id) = registry_with(num_channels, 512);
        let host = le_bytes(&samples);
        registry.write_data(id, &host, 0, host.len(), full).unwrap();

        let expected: Vec<u16> = samples
            .iter()
            .enumerate()
            .filter(|(i, _)| ch_mask >> (i % n) & 1 != 0)
            .map(|(_, &s)| s)
            .collect();
        let bytes_count = expected.len() * 2;
        let mut out = vec![0u8; bytes_count];
        prop_assert_eq!(registry.read_data(id, &mut out, 0, bytes_count, ch_mask), Ok(bytes_count));
        prop_assert_eq!(out, le_bytes(&expected));
    }

    #[test]
    fn writes_wrap_at_the_end_of_device_memory(
        half_size in 2usize..64,
        samples in proptest::collection::vec(any::<u16>(), 1..64),
    ) {
        let size = half_size * 2;
        let samples = &samples[..samples.len().min(half_size)];
        let host = le_bytes(samples);
        let offset = size - 2;

        let (mut registry, id) = registry_with(1, size);
        prop_assert_eq!(registry.write_data(id, &host, offset, host.len(), 1), Ok(host.len()));

        // Read the whole region back from offset 0 and check each byte landed modulo `size`.
        let mut image = vec![0u8; size];
        registry.read_data(id, &mut image, 0, size, 1).unwrap();
        for (pos, &byte) in image.iter().enumerate() {
            let rel = (pos + size - offset) % size;
            let want = host.get(rel).copied().unwrap_or(0);
            prop_assert_eq!(byte, want, "byte {} of {}", pos, size);
        }

        let mut out = vec![0u8; host.len()];
        registry.read_data(id, &mut out, offset, host.len(), 1).unwrap();
        prop_assert_eq!(out, host);
    }
}
