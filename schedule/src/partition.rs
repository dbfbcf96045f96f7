//! Lane partitioning.
//!
//! Splits `total` elements over at most `min(physical_lanes, MAX_LANES)` lanes in contiguous,
//! block-aligned slices, then cuts every slice into tiles of `tile_capacity`
//! elements with a possibly shorter tail tile.
//!
//! # Balance
//!
//! Only whole alignment blocks are balanced: the first `remainder_lanes` lanes
//! take one extra block ("large" lanes), the others take the base count
//! ("small" lanes). The `total % block` leftover elements that do not form a
//! whole block are appended to the final lane, which keeps every lane boundary
//! block-aligned and keeps `max - min <= block` for every input.
//!
//! ```text
//! total=100, block=4, lanes=8  =>  25 blocks: 3 per lane, 1 left over
//! lane:     0   1   2   3   4   5   6   7
//! elements: 16  12  12  12  12  12  12  12
//! ```

use std::ops::Range;

use smallvec::SmallVec;
use snafu::ensure;

use crate::error::{DegenerateCapacitySnafu, DescriptorCorruptSnafu, NoLanesSnafu, Result};

/// Largest lane count a tiling descriptor can describe; plans never activate more.
pub const MAX_LANES: usize = 64;

/// Elements per alignment block, rounded up to 1 for elements wider than the block.
pub fn block_elements_for(alignment_bytes: usize, element_bytes: usize) -> usize {
    match element_bytes {
        0 => 1,
        width => (alignment_bytes / width).max(1),
    }
}

/// One tile of a lane's iteration sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSpan {
    /// Iteration index within the lane.
    pub index: usize,
    /// Offset of the tile's first element, relative to the lane start.
    pub offset: usize,
    pub len: usize,
}

/// Per-lane slice of the work and its tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneTiling {
    /// First element of the lane in the linear output index space.
    pub start: usize,
    pub elements: usize,
    /// `ceil(elements / tile_capacity)`.
    pub iterations: usize,
    /// Size of the final tile, in `1..=tile_capacity`.
    pub tail: usize,
}

impl LaneTiling {
    fn new(start: usize, elements: usize, tile_capacity: usize) -> Self {
        let iterations = elements.div_ceil(tile_capacity);
        let tail = elements - (iterations - 1) * tile_capacity;
        Self { start, elements, iterations, tail }
    }

    pub fn end(&self) -> usize {
        self.start + self.elements
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Elements moved by iteration `index`.
    pub fn tile_len(&self, index: usize, tile_capacity: usize) -> usize {
        if index + 1 == self.iterations { self.tail } else { tile_capacity }
    }

    /// Tiles of this lane, in iteration order.
    pub fn tiles(&self, tile_capacity: usize) -> impl ExactSizeIterator<Item = TileSpan> + '_ {
        (0..self.iterations).map(move |index| TileSpan {
            index,
            offset: index * tile_capacity,
            len: self.tile_len(index, tile_capacity),
        })
    }
}

/// Static partition of one operator invocation over parallel lanes.
///
/// Built once on the control side and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionPlan {
    total_elements: usize,
    tile_capacity: usize,
    alignment_bytes: usize,
    element_bytes: usize,
    block_elements: usize,
    remainder_lanes: usize,
    large_lane_elements: usize,
    small_lane_elements: usize,
    lanes: SmallVec<[LaneTiling; 8]>,
}

impl PartitionPlan {
    /// Partition `total_elements` over at most `physical_lanes` lanes.
    ///
    /// An empty input yields a plan with no lanes; callers skip execution for it.
    #[tracing::instrument(level = "trace", skip_all, fields(total = total_elements, lanes = physical_lanes))]
    pub fn plan(
        total_elements: usize,
        physical_lanes: usize,
        tile_capacity: usize,
        alignment_bytes: usize,
        element_bytes: usize,
    ) -> Result<Self> {
        ensure!(physical_lanes > 0, NoLanesSnafu);
        ensure!(tile_capacity > 0, DegenerateCapacitySnafu { element_bytes, aligned_slot_bytes: 0usize });

        let block = block_elements_for(alignment_bytes, element_bytes);

        let mut plan = Self {
            total_elements,
            tile_capacity,
            alignment_bytes,
            element_bytes,
            block_elements: block,
            remainder_lanes: 0,
            large_lane_elements: 0,
            small_lane_elements: 0,
            lanes: SmallVec::new(),
        };

        if total_elements == 0 {
            return Ok(plan);
        }

        if total_elements <= tile_capacity {
            plan.large_lane_elements = total_elements;
            plan.small_lane_elements = total_elements;
            plan.lanes.push(LaneTiling::new(0, total_elements, tile_capacity));
            return Ok(plan);
        }

        let active = physical_lanes.min(MAX_LANES).min(total_elements.div_ceil(block));
        let full_blocks = total_elements / block;
        let leftover = total_elements % block;
        let blocks_per_lane = full_blocks / active;
        let remainder = full_blocks % active;

        plan.remainder_lanes = remainder;
        plan.small_lane_elements = blocks_per_lane * block;
        plan.large_lane_elements = if remainder > 0 { (blocks_per_lane + 1) * block } else { plan.small_lane_elements };

        let mut start = 0;
        for lane in 0..active {
            let mut elements = if lane < remainder { plan.large_lane_elements } else { plan.small_lane_elements };
            if lane + 1 == active {
                elements += leftover;
            }
            plan.lanes.push(LaneTiling::new(start, elements, tile_capacity));
            start += elements;
        }
        debug_assert_eq!(start, total_elements);

        Ok(plan)
    }

    /// Rebuild a plan from per-lane element counts, checking every plan invariant.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_lane_elements(
        total_elements: usize,
        tile_capacity: usize,
        alignment_bytes: usize,
        element_bytes: usize,
        block_elements: usize,
        remainder_lanes: usize,
        large_lane_elements: usize,
        small_lane_elements: usize,
        lane_elements: &[usize],
    ) -> Result<Self> {
        let corrupt = |reason: &'static str, value: usize| DescriptorCorruptSnafu { reason, value: value as u64 };

        ensure!(tile_capacity > 0, corrupt("zero tile capacity", 0));
        ensure!(
            block_elements == block_elements_for(alignment_bytes, element_bytes),
            corrupt("block size", block_elements)
        );
        ensure!(lane_elements.len() <= MAX_LANES, corrupt("lane count above maximum", lane_elements.len()));
        ensure!(
            remainder_lanes == 0 || remainder_lanes < lane_elements.len(),
            corrupt("remainder lanes not below lane count", remainder_lanes)
        );
        if remainder_lanes > 0 {
            ensure!(
                small_lane_elements.checked_add(block_elements) == Some(large_lane_elements),
                corrupt("large and small lanes differ by more than one block", large_lane_elements)
            );
        } else {
            ensure!(
                large_lane_elements == small_lane_elements,
                corrupt("large lane without remainder", large_lane_elements)
            );
        }

        let mut lanes = SmallVec::with_capacity(lane_elements.len());
        let mut start = 0usize;
        for (index, &elements) in lane_elements.iter().enumerate() {
            ensure!(elements > 0, corrupt("empty lane", index));
            if index + 1 == lane_elements.len() {
                let base = if index < remainder_lanes { large_lane_elements } else { small_lane_elements };
                ensure!(
                    elements >= base && elements - base < block_elements,
                    corrupt("final lane outside its block", elements)
                );
            } else if index < remainder_lanes {
                ensure!(elements == large_lane_elements, corrupt("large lane size", elements));
            } else {
                ensure!(elements == small_lane_elements, corrupt("small lane size", elements));
            }
            lanes.push(LaneTiling::new(start, elements, tile_capacity));
            start = start.checked_add(elements).ok_or_else(|| corrupt("lane sizes overflow", elements).build())?;
        }
        ensure!(start == total_elements, corrupt("lane sizes do not cover total", start));

        Ok(Self {
            total_elements,
            tile_capacity,
            alignment_bytes,
            element_bytes,
            block_elements,
            remainder_lanes,
            large_lane_elements,
            small_lane_elements,
            lanes,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of active lanes (0 for an empty input).
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn lanes(&self) -> &[LaneTiling] {
        &self.lanes
    }

    pub fn lane(&self, index: usize) -> Option<&LaneTiling> {
        self.lanes.get(index)
    }

    /// Linear `[start, end)` range of a lane in the output index space.
    pub fn lane_range(&self, index: usize) -> Option<Range<usize>> {
        self.lanes.get(index).map(LaneTiling::range)
    }

    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    pub fn tile_capacity(&self) -> usize {
        self.tile_capacity
    }

    pub fn alignment_bytes(&self) -> usize {
        self.alignment_bytes
    }

    pub fn element_bytes(&self) -> usize {
        self.element_bytes
    }

    /// Minimum granularity of a lane boundary, in elements.
    pub fn block_elements(&self) -> usize {
        self.block_elements
    }

    /// Lanes that received one extra alignment block.
    pub fn remainder_lanes(&self) -> usize {
        self.remainder_lanes
    }

    pub fn large_lane_elements(&self) -> usize {
        self.large_lane_elements
    }

    pub fn small_lane_elements(&self) -> usize {
        self.small_lane_elements
    }

    /// Total number of tiles across all lanes.
    pub fn total_tiles(&self) -> usize {
        self.lanes.iter().map(|lane| lane.iterations).sum()
    }
}
