//! Shared fixtures for executor tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use lanetile_device::{CpuDma, DmaEngine, Error as DeviceError, TransferDirection};
use lanetile_dtype::ScalarDType;
use lanetile_schedule::{DeviceProfile, TilingDescriptor, TilingRequest, build_tiling_descriptor};

/// Small device: 256 bytes of scratch over two slots => 32 f32 per tile.
pub fn small_profile(physical_lanes: usize) -> DeviceProfile {
    DeviceProfile::builder().physical_lanes(physical_lanes).scratch_bytes(256).alignment_bytes(16).build()
}

pub fn f32_descriptor(total: usize, physical_lanes: usize) -> TilingDescriptor {
    let request = TilingRequest::for_dtype(ScalarDType::Float32, total, &small_profile(physical_lanes));
    build_tiling_descriptor(&request).expect("valid request")
}

pub fn u32_sources_descriptor(lengths: &[usize], profile: &DeviceProfile) -> TilingDescriptor {
    let request = TilingRequest::for_sources(ScalarDType::UInt32, lengths.to_vec(), profile);
    build_tiling_descriptor(&request).expect("valid request")
}

/// `lengths.len()` source arrays of consecutive `u32` values.
pub fn u32_sources(lengths: &[usize]) -> Vec<Vec<u32>> {
    let mut next = 0u32;
    lengths
        .iter()
        .map(|&len| {
            let source: Vec<u32> = (next..next + len as u32).collect();
            next += len as u32;
            source
        })
        .collect()
}

/// Copy engine that fails the `fail_at`-th transfer (0-based) in `direction`.
#[derive(Debug)]
pub struct FaultyDma {
    direction: TransferDirection,
    fail_at: usize,
    calls: AtomicUsize,
}

impl FaultyDma {
    pub fn new(direction: TransferDirection, fail_at: usize) -> Self {
        Self { direction, fail_at, calls: AtomicUsize::new(0) }
    }

    fn check(&self, direction: TransferDirection, bytes: usize) -> Result<(), DeviceError> {
        if direction == self.direction && self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(DeviceError::TransferFailed { direction, bytes, reason: "injected fault".into() });
        }
        Ok(())
    }
}

impl DmaEngine for FaultyDma {
    fn copy_in(&self, src: &[u8], dst: &mut [u8]) -> Result<(), DeviceError> {
        self.check(TransferDirection::Inbound, src.len())?;
        CpuDma.copy_in(src, dst)
    }

    fn copy_out(&self, src: &[u8], dst: &mut [u8]) -> Result<(), DeviceError> {
        self.check(TransferDirection::Outbound, src.len())?;
        CpuDma.copy_out(src, dst)
    }
}
