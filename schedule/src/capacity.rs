//! Scratch-buffer capacity model.
//!
//! Answers one question: how many elements of a given width fit in one pipeline
//! slot of the on-chip scratch buffer, once the buffer is shared by `buffer_slots`
//! slots (double buffering), by `working_factor` tile-sized regions inside each
//! slot (widened working copies), and rounded down to the transfer alignment.
//!
//! ```text
//! slot_bytes = scratch_bytes / (buffer_slots * working_factor)
//! capacity   = floor(slot_bytes / alignment_bytes) * alignment_bytes / element_bytes
//! ```

use bon::bon;
use lanetile_dtype::ScalarDType;
use snafu::ensure;

use crate::error::{DegenerateCapacitySnafu, InvalidCapacitySnafu, Result};

/// Default transfer granularity of the DMA engine.
pub const DEFAULT_ALIGNMENT_BYTES: usize = 32;

/// Default pipeline depth (double buffering).
pub const DEFAULT_BUFFER_SLOTS: usize = 2;

/// Parameters of the capacity computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapacityModel {
    pub element_bytes: usize,
    /// Whole scratch buffer, shared by every slot.
    pub scratch_bytes: usize,
    pub buffer_slots: usize,
    pub alignment_bytes: usize,
    /// Tile-sized regions each slot holds (1 unless the kernel widens elements).
    pub working_factor: usize,
}

#[bon]
impl CapacityModel {
    #[builder]
    pub fn new(
        element_bytes: usize,
        scratch_bytes: usize,
        #[builder(default = DEFAULT_BUFFER_SLOTS)] buffer_slots: usize,
        #[builder(default = DEFAULT_ALIGNMENT_BYTES)] alignment_bytes: usize,
        #[builder(default = 1)] working_factor: usize,
    ) -> Self {
        Self { element_bytes, scratch_bytes, buffer_slots, alignment_bytes, working_factor }
    }

    /// Capacity model for `dtype`, with the working factor its compute promotion needs.
    pub fn for_dtype(dtype: ScalarDType, scratch_bytes: usize, buffer_slots: usize, alignment_bytes: usize) -> Self {
        Self {
            element_bytes: dtype.bytes(),
            scratch_bytes,
            buffer_slots,
            alignment_bytes,
            working_factor: dtype.working_buffer_factor(),
        }
    }

    /// Bytes of one pipeline slot available to a single tile.
    pub fn slot_bytes(&self) -> Result<usize> {
        self.check(self.element_bytes > 0, "element width is zero")?;
        self.check(self.buffer_slots > 0, "no buffer slots")?;
        self.check(self.working_factor > 0, "working factor is zero")?;
        self.check(self.alignment_bytes > 0, "alignment is zero")?;
        self.check(self.scratch_bytes % self.alignment_bytes == 0, "alignment does not divide scratch size")?;

        let slot_bytes = self
            .buffer_slots
            .checked_mul(self.working_factor)
            .map(|regions| self.scratch_bytes / regions)
            .unwrap_or(0);
        self.check(slot_bytes >= self.alignment_bytes, "slot smaller than one aligned block")?;
        Ok(slot_bytes)
    }

    /// Elements per tile. Always at least 1 on success.
    pub fn tile_capacity(&self) -> Result<usize> {
        let slot_bytes = self.slot_bytes()?;
        let aligned = slot_bytes / self.alignment_bytes * self.alignment_bytes;
        let capacity = aligned / self.element_bytes;
        ensure!(
            capacity > 0,
            DegenerateCapacitySnafu { element_bytes: self.element_bytes, aligned_slot_bytes: aligned }
        );
        Ok(capacity)
    }

    fn check(&self, condition: bool, reason: &'static str) -> Result<()> {
        ensure!(
            condition,
            InvalidCapacitySnafu {
                reason,
                element_bytes: self.element_bytes,
                scratch_bytes: self.scratch_bytes,
                buffer_slots: self.buffer_slots,
                alignment_bytes: self.alignment_bytes,
                working_factor: self.working_factor,
            }
        );
        Ok(())
    }
}

/// Elements of `element_bytes` width that fit in one aligned slot of the scratch buffer.
pub fn compute_tile_capacity(
    element_bytes: usize,
    scratch_bytes: usize,
    buffer_slots: usize,
    alignment_bytes: usize,
) -> Result<usize> {
    CapacityModel { element_bytes, scratch_bytes, buffer_slots, alignment_bytes, working_factor: 1 }.tile_capacity()
}
