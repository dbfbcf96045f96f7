//! Planning entry point.
//!
//! ```text
//! TilingRequest ─► CapacityModel ─► PartitionPlan ─► (map_boundaries) ─► TilingDescriptor
//! ```
//!
//! Every configuration error surfaces here, before any lane is launched.

use bon::bon;
use lanetile_dtype::ScalarDType;

use crate::boundary::map_boundaries;
use crate::capacity::{CapacityModel, DEFAULT_ALIGNMENT_BYTES, DEFAULT_BUFFER_SLOTS};
use crate::config::DeviceProfile;
use crate::descriptor::TilingDescriptor;
use crate::error::Result;
use crate::partition::PartitionPlan;

/// Everything the planner needs for one operator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TilingRequest {
    pub total_elements: usize,
    pub element_bytes: usize,
    pub physical_lanes: usize,
    pub scratch_bytes: usize,
    pub buffer_slots: usize,
    pub alignment_bytes: usize,
    pub working_factor: usize,
    /// Source array lengths for multi-source workloads (concatenation, split).
    pub source_lengths: Option<Vec<usize>>,
}

#[bon]
impl TilingRequest {
    #[builder]
    pub fn new(
        total_elements: usize,
        element_bytes: usize,
        physical_lanes: usize,
        scratch_bytes: usize,
        #[builder(default = DEFAULT_BUFFER_SLOTS)] buffer_slots: usize,
        #[builder(default = DEFAULT_ALIGNMENT_BYTES)] alignment_bytes: usize,
        #[builder(default = 1)] working_factor: usize,
        source_lengths: Option<Vec<usize>>,
    ) -> Self {
        Self {
            total_elements,
            element_bytes,
            physical_lanes,
            scratch_bytes,
            buffer_slots,
            alignment_bytes,
            working_factor,
            source_lengths,
        }
    }

    /// Request for `total_elements` of `dtype` on `profile`.
    pub fn for_dtype(dtype: ScalarDType, total_elements: usize, profile: &DeviceProfile) -> Self {
        Self {
            total_elements,
            element_bytes: dtype.bytes(),
            physical_lanes: profile.physical_lanes,
            scratch_bytes: profile.scratch_bytes,
            buffer_slots: profile.buffer_slots,
            alignment_bytes: profile.alignment_bytes,
            working_factor: dtype.working_buffer_factor(),
            source_lengths: None,
        }
    }

    /// Concatenation-style request: the total is the sum of `lengths`.
    ///
    /// A sum past `usize::MAX` saturates here and is rejected by [`build_tiling_descriptor`].
    pub fn for_sources(dtype: ScalarDType, lengths: Vec<usize>, profile: &DeviceProfile) -> Self {
        let total = lengths.iter().fold(0usize, |acc, &length| acc.saturating_add(length));
        Self { source_lengths: Some(lengths), ..Self::for_dtype(dtype, total, profile) }
    }

    pub fn capacity_model(&self) -> CapacityModel {
        CapacityModel {
            element_bytes: self.element_bytes,
            scratch_bytes: self.scratch_bytes,
            buffer_slots: self.buffer_slots,
            alignment_bytes: self.alignment_bytes,
            working_factor: self.working_factor,
        }
    }
}

/// Build the tiling descriptor for `request`.
///
/// Deterministic: identical requests encode to identical bytes.
#[tracing::instrument(skip_all, fields(total = request.total_elements, element_bytes = request.element_bytes))]
pub fn build_tiling_descriptor(request: &TilingRequest) -> Result<TilingDescriptor> {
    let tile_capacity = request.capacity_model().tile_capacity()?;
    let plan = PartitionPlan::plan(
        request.total_elements,
        request.physical_lanes,
        tile_capacity,
        request.alignment_bytes,
        request.element_bytes,
    )?;

    let source_count = match &request.source_lengths {
        Some(lengths) => {
            map_boundaries(&plan, lengths)?;
            Some(lengths.len())
        }
        None => None,
    };

    tracing::debug!(
        lanes = plan.lane_count(),
        tile_capacity,
        block = plan.block_elements(),
        large = plan.large_lane_elements(),
        small = plan.small_lane_elements(),
        remainder_lanes = plan.remainder_lanes(),
        tiles = plan.total_tiles(),
        sources = ?source_count,
        "tiling plan built"
    );

    Ok(TilingDescriptor::new(plan, request.buffer_slots, source_count).with_working_factor(request.working_factor))
}
