//! Emulated on-device RAM.
//!
//! The demo device stages samples in a fixed block of "DDR" before a (virtual) DMA burst moves
//! them to or from the converter. Addressing is modular: logical offset `o` lands on byte
//! `o % size`, so no offset is ever out of range.
//!
//! Multi-byte accesses wrap byte by byte. Writers are expected to keep `size` a multiple of their
//! sample stride so a sample never straddles the wrap point; the memory itself does not check.

use iio_framework::{IioError, Result};

#[derive(Debug, Clone)]
pub struct DeviceMemory {
    /// Bus address the region is mapped at. Only used for tracing.
    base_addr: u64,
    bytes: Vec<u8>,
}

impl DeviceMemory {
    /// Allocate a zero-filled region of `size` bytes.
    pub fn new(base_addr: u64, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(IioError::InvalidArgument("device memory size must be non-zero"));
        }
        if base_addr.checked_add(size as u64).is_none() {
            return Err(IioError::InvalidArgument("device memory wraps the address space"));
        }
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| IioError::OutOfMemory { bytes: size })?;
        bytes.resize(size, 0);
        Ok(Self { base_addr, bytes })
    }

    #[inline]
    fn index(&self, offset: usize) -> usize {
        offset % self.bytes.len()
    }

    /// Bus address backing logical `offset`.
    pub fn physical_addr(&self, offset: usize) -> u64 {
        self.base_addr + self.index(offset) as u64
    }

    pub fn read_u16_le(&self, offset: usize) -> u16 {
        let mut buf = [0u8; 2];
        self.read_into(offset, &mut buf);
        u16::from_le_bytes(buf)
    }

    pub fn write_u16_le(&mut self, offset: usize, value: u16) {
        self.write_from(offset, &value.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, offset: usize, value: u32) {
        self.write_from(offset, &value.to_le_bytes());
    }

    /// Copy `dst.len()` bytes starting at logical `offset`, wrapping at the end of the region.
    pub fn read_into(&self, offset: usize, dst: &mut [u8]) {
        let mut pos = self.index(offset);
        let mut done = 0;
        while done < dst.len() {
            let run = (dst.len() - done).min(self.bytes.len() - pos);
            dst[done..done + run].copy_from_slice(&self.bytes[pos..pos + run]);
            done += run;
            pos = 0;
        }
    }

    /// Copy `src` into the region starting at logical `offset`, wrapping at the end.
    ///
    /// A `src` longer than the region overwrites earlier bytes of the same call.
    pub fn write_from(&mut self, offset: usize, src: &[u8]) {
        let mut pos = self.index(offset);
        let mut done = 0;
        while done < src.len() {
            let run = (src.len() - done).min(self.bytes.len() - pos);
            self.bytes[pos..pos + run].copy_from_slice(&src[done..done + run]);
            done += run;
            pos = 0;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
