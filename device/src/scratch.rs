//! Per-lane scratch memory.
//!
//! A [`ScratchSlot`] stands in for one pipeline slot of a lane's on-chip buffer:
//! a fixed number of bytes, aligned to [`SCRATCH_ALIGN`] so that any primitive
//! element type can be viewed in place. A [`ScratchPool`] holds the slots of one
//! lane; pools are never shared between lanes.

use bytemuck::{Pod, Zeroable};
use parking_lot::{Mutex, MutexGuard};
use snafu::ensure;

use crate::error::{ElementMisalignedSnafu, InvalidViewSnafu, Result};

/// Alignment of every scratch slot, in bytes.
pub const SCRATCH_ALIGN: usize = 64;

#[repr(C, align(64))]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Chunk([u8; SCRATCH_ALIGN]);

/// One pipeline slot of scratch memory.
pub struct ScratchSlot {
    chunks: Box<[Chunk]>,
    len: usize,
}

impl std::fmt::Debug for ScratchSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchSlot").field("len", &self.len).finish()
    }
}

impl ScratchSlot {
    /// Zero-initialized slot of `len` bytes.
    pub fn new(len: usize) -> Self {
        let chunks = vec![Chunk::zeroed(); len.div_ceil(SCRATCH_ALIGN)].into_boxed_slice();
        Self { chunks, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.chunks)[..self.len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.chunks)[..self.len]
    }

    /// Leading `bytes` of the slot and the rest of it, both mutable.
    pub fn split_mut(&mut self, bytes: usize) -> Result<(&mut [u8], &mut [u8])> {
        ensure!(bytes <= self.len, InvalidViewSnafu { offset: 0usize, size: bytes, buffer_size: self.len });
        Ok(self.as_bytes_mut().split_at_mut(bytes))
    }
}

/// Reinterpret a scratch region as `T` elements.
///
/// Fails when the region length is not a whole number of elements; scratch
/// regions start on a [`SCRATCH_ALIGN`] boundary, so alignment always holds.
pub fn cast_region_mut<T: Pod>(region: &mut [u8]) -> Result<&mut [T]> {
    let bytes = region.len();
    bytemuck::try_cast_slice_mut(region)
        .map_err(|_| ElementMisalignedSnafu { bytes, element_bytes: size_of::<T>() }.build())
}

/// The pipeline slots of one lane.
#[derive(Debug)]
pub struct ScratchPool {
    slots: Box<[Mutex<ScratchSlot>]>,
    slot_bytes: usize,
}

impl ScratchPool {
    /// `buffer_slots` slots of `slot_bytes` each.
    pub fn new(buffer_slots: usize, slot_bytes: usize) -> Self {
        let slots = (0..buffer_slots).map(|_| Mutex::new(ScratchSlot::new(slot_bytes))).collect();
        tracing::trace!(buffer_slots, slot_bytes, "scratch pool allocated");
        Self { slots, slot_bytes }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_bytes(&self) -> usize {
        self.slot_bytes
    }

    /// Slot used by pipeline iteration `iteration`.
    ///
    /// The pipeline's timeline signals keep producer and consumer on different
    /// slots, so the lock is never contended.
    pub fn slot(&self, iteration: usize) -> MutexGuard<'_, ScratchSlot> {
        self.slots[iteration % self.slots.len()].lock()
    }
}
