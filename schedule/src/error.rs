//! Planning errors.
//!
//! Everything here is a configuration-class failure: it is reported while the plan
//! is being built or decoded, before any lane starts.

use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Scratch buffer cannot hold one aligned block per pipeline slot.
    #[snafu(display(
        "invalid capacity ({reason}): element_bytes={element_bytes}, scratch_bytes={scratch_bytes}, \
         buffer_slots={buffer_slots}, alignment_bytes={alignment_bytes}, working_factor={working_factor}"
    ))]
    InvalidCapacity {
        reason: &'static str,
        element_bytes: usize,
        scratch_bytes: usize,
        buffer_slots: usize,
        alignment_bytes: usize,
        working_factor: usize,
    },

    /// Tile capacity computed (or supplied) as zero elements.
    #[snafu(display(
        "degenerate tile capacity: {element_bytes}-byte elements in {aligned_slot_bytes} aligned slot bytes"
    ))]
    DegenerateCapacity { element_bytes: usize, aligned_slot_bytes: usize },

    #[snafu(display("physical lane count must be at least 1"))]
    NoLanes,


    /// Boundary mapping input inconsistent with the plan it is applied to.
    #[snafu(display("source lengths sum to {actual}, plan covers {expected} elements"))]
    SourceLengthMismatch { expected: usize, actual: usize },

    /// Source lengths whose sum does not fit in `usize`.
    #[snafu(display("source lengths overflow at source {source_index} (length {length})"))]
    SourceLengthOverflow { source_index: usize, length: usize },

    #[snafu(display("range {start}..{end} outside 0..{total}"))]
    RangeOutOfBounds { start: usize, end: usize, total: usize },

    #[snafu(display("descriptor length mismatch: expected {expected} bytes, got {actual}"))]
    DescriptorLength { expected: usize, actual: usize },

    #[snafu(display("descriptor magic mismatch: found {found:#010x}"))]
    DescriptorMagic { found: u32 },

    #[snafu(display("unsupported descriptor version {found} (supported: {supported})"))]
    DescriptorVersion { found: u32, supported: u32 },

    #[snafu(display("corrupt descriptor: {reason} (value {value})"))]
    DescriptorCorrupt { reason: &'static str, value: u64 },

    #[snafu(display("descriptor region too small: {required} bytes required, {available} available"))]
    RegionTooSmall { required: usize, available: usize },
}
