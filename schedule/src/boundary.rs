//! Multi-source boundary mapping.
//!
//! When a lane's linear range covers several source arrays laid end to end (the
//! concatenation case, or its inverse, splitting), the lane needs the range as a
//! list of `(source, offset, length)` runs. `SourceTable` holds the prefix sums of
//! the source lengths and turns any linear range into those runs on demand:
//!
//! ```text
//! sources:   [ 0 1 2 3 4 5 6 7 8 9 ][ a ][ b c d ]
//! prefix:    0                     10   11      14
//! lane 1:                  [ 7 ..  ..  ..  c )            range 7..13
//! segments:  (0, 7, 3) (1, 0, 1) (2, 0, 2)
//! ```
//!
//! Segments are emitted in ascending source order and never overlap; zero-length
//! sources never produce a segment.

use std::ops::Range;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use crate::error::{RangeOutOfBoundsSnafu, Result, SourceLengthMismatchSnafu, SourceLengthOverflowSnafu};
use crate::partition::PartitionPlan;

/// A contiguous run of one source array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundarySegment {
    pub source_index: usize,
    /// First element of the run within its source.
    pub source_offset: usize,
    /// Always greater than zero.
    pub length: usize,
}

impl BoundarySegment {
    pub fn source_range(&self) -> Range<usize> {
        self.source_offset..self.source_offset + self.length
    }
}

/// Prefix sums of the source lengths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceTable {
    /// `prefix[i]` is the linear offset of source `i`; the last entry is the total.
    prefix: SmallVec<[usize; 9]>,
}

impl SourceTable {
    /// Fails with `SourceLengthOverflow` when the lengths do not sum within `usize`.
    pub fn new(lengths: &[usize]) -> Result<Self> {
        let mut prefix = SmallVec::with_capacity(lengths.len() + 1);
        prefix.push(0);
        let mut acc = 0usize;
        for (source_index, &length) in lengths.iter().enumerate() {
            acc = acc.checked_add(length).context(SourceLengthOverflowSnafu { source_index, length })?;
            prefix.push(acc);
        }
        Ok(Self { prefix })
    }

    pub fn total(&self) -> usize {
        self.prefix[self.prefix.len() - 1]
    }

    pub fn source_count(&self) -> usize {
        self.prefix.len() - 1
    }

    pub fn source_len(&self, index: usize) -> usize {
        self.prefix[index + 1] - self.prefix[index]
    }

    /// Linear range a source occupies.
    pub fn source_range(&self, index: usize) -> Range<usize> {
        self.prefix[index]..self.prefix[index + 1]
    }

    /// Source containing linear `offset`, or `None` past the end.
    pub fn locate(&self, offset: usize) -> Option<usize> {
        // First source whose end lies past `offset`; empty sources end where they start.
        let index = self.prefix[1..].partition_point(|&end| end <= offset);
        (index < self.source_count()).then_some(index)
    }

    /// Segments covering a linear `range`.
    pub fn segments(&self, range: Range<usize>) -> Result<Segments<'_>> {
        let total = self.total();
        ensure!(
            range.start <= range.end && range.end <= total,
            RangeOutOfBoundsSnafu { start: range.start, end: range.end, total }
        );
        let source = self.locate(range.start).unwrap_or(self.source_count());
        Ok(Segments { table: self, source, cursor: range.start, end: range.end })
    }
}

/// Non-allocating iterator over the segments of one linear range.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    table: &'a SourceTable,
    source: usize,
    cursor: usize,
    end: usize,
}

impl Iterator for Segments<'_> {
    type Item = BoundarySegment;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.end {
            let source = self.source;
            let Range { start: source_start, end: source_end } = self.table.source_range(source);
            self.source += 1;
            if source_end <= self.cursor {
                continue;
            }

            let segment_end = source_end.min(self.end);
            let segment = BoundarySegment {
                source_index: source,
                source_offset: self.cursor - source_start,
                length: segment_end - self.cursor,
            };
            self.cursor = segment_end;
            return Some(segment);
        }
        None
    }
}

impl std::iter::FusedIterator for Segments<'_> {}

/// Segments of every lane of `plan`, in lane order.
///
/// `lengths` must sum to the plan's element count.
#[tracing::instrument(level = "debug", skip_all, fields(sources = lengths.len(), lanes = plan.lane_count()))]
pub fn map_boundaries(plan: &PartitionPlan, lengths: &[usize]) -> Result<Vec<SmallVec<[BoundarySegment; 4]>>> {
    let table = SourceTable::new(lengths)?;
    ensure!(
        table.total() == plan.total_elements(),
        SourceLengthMismatchSnafu { expected: plan.total_elements(), actual: table.total() }
    );

    plan.lanes()
        .iter()
        .map(|lane| {
            let segments: SmallVec<[BoundarySegment; 4]> = table.segments(lane.range())?.collect();
            tracing::trace!(
                lane.start = lane.start,
                lane.elements = lane.elements,
                segments = segments.len(),
                "lane mapped"
            );
            Ok(segments)
        })
        .collect()
}
