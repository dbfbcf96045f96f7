//! Tiling descriptor: the flat record handed from the planner to the lanes.
//!
//! The encoded form is one fixed-size `#[repr(C)]` header in host byte order. Per-lane
//! data lives in arrays sized for [`MAX_LANES`], so the encoded size never depends on
//! the input shape or on the number of sources:
//!
//! ```text
//! ┌───────────────┬────────────────────────────────────────────────────────────┐
//! │ magic/version │ lane_count tile_capacity ... slots ... working_factor      │
//! ├───────────────┴────────────────────────────────────────────────────────────┤
//! │ lane_elements[64]   iteration_counts[64]   tail_sizes[64]                  │
//! │ lane_spans[64][2]   (only meaningful when FLAG_MULTI_SOURCE is set)        │
//! └────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-source descriptors store each lane's cumulative `[start, end)` pair, not its
//! segment list; lanes rebuild segments at launch from the source lengths.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;
use snafu::ensure;

use crate::error::{
    DescriptorCorruptSnafu, DescriptorLengthSnafu, DescriptorMagicSnafu, DescriptorVersionSnafu, RegionTooSmallSnafu,
    Result,
};
use crate::partition::{MAX_LANES, PartitionPlan};

pub const DESCRIPTOR_MAGIC: u32 = 0x4C54_494C;
pub const DESCRIPTOR_VERSION: u32 = 1;

const FLAG_MULTI_SOURCE: u64 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DescriptorHeader {
    magic: u32,
    version: u32,
    lane_count: u64,
    tile_capacity: u64,
    alignment_bytes: u64,
    element_bytes: u64,
    block_elements: u64,
    buffer_slots: u64,
    remainder_lanes: u64,
    flags: u64,
    source_count: u64,
    total_elements: u64,
    large_lane_elements: u64,
    small_lane_elements: u64,
    working_factor: u64,
    lane_elements: [u64; MAX_LANES],
    iteration_counts: [u64; MAX_LANES],
    tail_sizes: [u64; MAX_LANES],
    lane_spans: [[u64; 2]; MAX_LANES],
}

/// Size of an encoded descriptor in bytes.
pub const DESCRIPTOR_BYTES: usize = std::mem::size_of::<DescriptorHeader>();

/// Per-lane cumulative offsets of a multi-source workload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundaryTable {
    source_count: usize,
    lane_spans: SmallVec<[Range<usize>; 8]>,
}

impl BoundaryTable {
    fn for_plan(plan: &PartitionPlan, source_count: usize) -> Self {
        Self { source_count, lane_spans: plan.lanes().iter().map(|lane| lane.range()).collect() }
    }

    pub fn source_count(&self) -> usize {
        self.source_count
    }

    /// Linear `[start, end)` of a lane in the concatenated index space.
    pub fn lane_span(&self, lane: usize) -> Option<Range<usize>> {
        self.lane_spans.get(lane).cloned()
    }

    pub fn lane_spans(&self) -> &[Range<usize>] {
        &self.lane_spans
    }
}

/// Decoded, immutable tiling plan as seen by the execution side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TilingDescriptor {
    plan: PartitionPlan,
    buffer_slots: usize,
    working_factor: usize,
    boundaries: Option<BoundaryTable>,
}

impl TilingDescriptor {
    /// Descriptor for `plan`; `source_count` marks a multi-source workload.
    pub fn new(plan: PartitionPlan, buffer_slots: usize, source_count: Option<usize>) -> Self {
        let boundaries = source_count.map(|count| BoundaryTable::for_plan(&plan, count));
        Self { plan, buffer_slots, working_factor: 1, boundaries }
    }

    /// Record the working factor the tile capacity was computed with.
    pub fn with_working_factor(mut self, working_factor: usize) -> Self {
        self.working_factor = working_factor.max(1);
        self
    }

    pub fn plan(&self) -> &PartitionPlan {
        &self.plan
    }

    /// Pipeline depth the tile capacity was computed for.
    pub fn buffer_slots(&self) -> usize {
        self.buffer_slots
    }

    /// Tile-sized regions each slot was budgeted for; kernels may not use more.
    pub fn working_factor(&self) -> usize {
        self.working_factor
    }

    pub fn boundaries(&self) -> Option<&BoundaryTable> {
        self.boundaries.as_ref()
    }

    pub fn is_multi_source(&self) -> bool {
        self.boundaries.is_some()
    }

    /// Encode into a freshly allocated buffer of [`DESCRIPTOR_BYTES`] bytes.
    pub fn encode(&self) -> Vec<u8> {
        bytemuck::bytes_of(&self.header()).to_vec()
    }

    /// Encode into a caller-provided region; returns the number of bytes written.
    pub fn encode_into(&self, region: &mut [u8]) -> Result<usize> {
        ensure!(
            region.len() >= DESCRIPTOR_BYTES,
            RegionTooSmallSnafu { required: DESCRIPTOR_BYTES, available: region.len() }
        );
        region[..DESCRIPTOR_BYTES].copy_from_slice(bytemuck::bytes_of(&self.header()));
        Ok(DESCRIPTOR_BYTES)
    }

    /// Decode and validate an encoded descriptor.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() == DESCRIPTOR_BYTES,
            DescriptorLengthSnafu { expected: DESCRIPTOR_BYTES, actual: bytes.len() }
        );
        let header: DescriptorHeader = bytemuck::pod_read_unaligned(bytes);

        ensure!(header.magic == DESCRIPTOR_MAGIC, DescriptorMagicSnafu { found: header.magic });
        ensure!(
            header.version == DESCRIPTOR_VERSION,
            DescriptorVersionSnafu { found: header.version, supported: DESCRIPTOR_VERSION }
        );
        ensure!(
            header.lane_count <= MAX_LANES as u64,
            DescriptorCorruptSnafu { reason: "lane count above maximum", value: header.lane_count }
        );
        ensure!(
            header.flags & !FLAG_MULTI_SOURCE == 0,
            DescriptorCorruptSnafu { reason: "unknown flags", value: header.flags }
        );

        let lane_count = header.lane_count as usize;
        let lane_elements: SmallVec<[usize; 8]> =
            header.lane_elements[..lane_count].iter().map(|&n| to_usize(n)).collect::<Result<_>>()?;

        let plan = PartitionPlan::from_lane_elements(
            to_usize(header.total_elements)?,
            to_usize(header.tile_capacity)?,
            to_usize(header.alignment_bytes)?,
            to_usize(header.element_bytes)?,
            to_usize(header.block_elements)?,
            to_usize(header.remainder_lanes)?,
            to_usize(header.large_lane_elements)?,
            to_usize(header.small_lane_elements)?,
            &lane_elements,
        )?;

        for (index, lane) in plan.lanes().iter().enumerate() {
            ensure!(
                header.iteration_counts[index] == lane.iterations as u64,
                DescriptorCorruptSnafu { reason: "iteration count", value: header.iteration_counts[index] }
            );
            ensure!(
                header.tail_sizes[index] == lane.tail as u64,
                DescriptorCorruptSnafu { reason: "tail size", value: header.tail_sizes[index] }
            );
        }
        ensure_zeroed(&header.lane_elements[lane_count..], "unused lane entry")?;
        ensure_zeroed(&header.iteration_counts[lane_count..], "unused iteration entry")?;
        ensure_zeroed(&header.tail_sizes[lane_count..], "unused tail entry")?;
        ensure!(header.buffer_slots > 0, DescriptorCorruptSnafu { reason: "no buffer slots", value: 0u64 });
        ensure!(header.working_factor > 0, DescriptorCorruptSnafu { reason: "zero working factor", value: 0u64 });

        let boundaries = if header.flags & FLAG_MULTI_SOURCE != 0 {
            let mut lane_spans = SmallVec::with_capacity(lane_count);
            for (index, lane) in plan.lanes().iter().enumerate() {
                let [start, end] = header.lane_spans[index];
                let span = to_usize(start)?..to_usize(end)?;
                ensure!(span == lane.range(), DescriptorCorruptSnafu { reason: "lane span", value: start });
                lane_spans.push(span);
            }
            Some(BoundaryTable { source_count: to_usize(header.source_count)?, lane_spans })
        } else {
            ensure!(
                header.source_count == 0,
                DescriptorCorruptSnafu { reason: "sources without flag", value: header.source_count }
            );
            None
        };
        let used_spans = if boundaries.is_some() { lane_count } else { 0 };
        for &[start, end] in &header.lane_spans[used_spans..] {
            ensure!(
                start == 0 && end == 0,
                DescriptorCorruptSnafu { reason: "unused span entry", value: start.max(end) }
            );
        }

        Ok(Self {
            plan,
            buffer_slots: to_usize(header.buffer_slots)?,
            working_factor: to_usize(header.working_factor)?,
            boundaries,
        })
    }

    fn header(&self) -> DescriptorHeader {
        let plan = &self.plan;
        let mut header = DescriptorHeader::zeroed();
        header.magic = DESCRIPTOR_MAGIC;
        header.version = DESCRIPTOR_VERSION;
        header.lane_count = plan.lane_count() as u64;
        header.tile_capacity = plan.tile_capacity() as u64;
        header.alignment_bytes = plan.alignment_bytes() as u64;
        header.element_bytes = plan.element_bytes() as u64;
        header.block_elements = plan.block_elements() as u64;
        header.buffer_slots = self.buffer_slots as u64;
        header.remainder_lanes = plan.remainder_lanes() as u64;
        header.total_elements = plan.total_elements() as u64;
        header.large_lane_elements = plan.large_lane_elements() as u64;
        header.small_lane_elements = plan.small_lane_elements() as u64;
        header.working_factor = self.working_factor as u64;

        for (index, lane) in plan.lanes().iter().enumerate() {
            header.lane_elements[index] = lane.elements as u64;
            header.iteration_counts[index] = lane.iterations as u64;
            header.tail_sizes[index] = lane.tail as u64;
        }

        if let Some(boundaries) = &self.boundaries {
            header.flags |= FLAG_MULTI_SOURCE;
            header.source_count = boundaries.source_count as u64;
            for (index, span) in boundaries.lane_spans.iter().enumerate() {
                header.lane_spans[index] = [span.start as u64, span.end as u64];
            }
        }

        header
    }
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| DescriptorCorruptSnafu { reason: "value exceeds address space", value }.build())
}

fn ensure_zeroed(entries: &[u64], reason: &'static str) -> Result<()> {
    match entries.iter().find(|&&value| value != 0) {
        Some(&value) => DescriptorCorruptSnafu { reason, value }.fail(),
        None => Ok(()),
    }
}
