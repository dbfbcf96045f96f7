//! Views into global memory.
//!
//! A view is an element-typed window over a byte buffer.
//! Bounds and element alignment are checked once when the view is built; the
//! per-tile accessors used inside a lane's hot loop then only index.

use std::ops::Range;

use snafu::ensure;

use crate::error::{ElementMisalignedSnafu, InvalidViewSnafu, Result};

fn check_elements(bytes: usize, element_bytes: usize) -> Result<usize> {
    ensure!(element_bytes > 0 && bytes % element_bytes == 0, ElementMisalignedSnafu { bytes, element_bytes });
    Ok(bytes / element_bytes)
}

fn check_window(range: &Range<usize>, len: usize) -> Result<()> {
    ensure!(
        range.start <= range.end && range.end <= len,
        InvalidViewSnafu { offset: range.start, size: range.end.saturating_sub(range.start), buffer_size: len }
    );
    Ok(())
}

/// Read-only view of one global buffer.
#[derive(Debug, Clone, Copy)]
pub struct GlobalSlice<'a> {
    bytes: &'a [u8],
    element_bytes: usize,
}

impl<'a> GlobalSlice<'a> {
    /// View the whole of `bytes` as elements of `element_bytes` width.
    pub fn new(bytes: &'a [u8], element_bytes: usize) -> Result<Self> {
        check_elements(bytes.len(), element_bytes)?;
        Ok(Self { bytes, element_bytes })
    }

    /// Length in elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.element_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn element_bytes(&self) -> usize {
        self.element_bytes
    }

    /// Bytes of `count` elements starting at element `start`.
    ///
    /// Bounds were established when the view was built; callers pass ranges
    /// derived from the same plan.
    pub fn elements(&self, start: usize, count: usize) -> &'a [u8] {
        &self.bytes[start * self.element_bytes..(start + count) * self.element_bytes]
    }
}

/// Writable window of global memory owned by one lane.
#[derive(Debug)]
pub struct GlobalSliceMut<'a> {
    bytes: &'a mut [u8],
    offset: usize,
    element_bytes: usize,
}

impl<'a> GlobalSliceMut<'a> {
    pub fn new(bytes: &'a mut [u8], element_bytes: usize) -> Result<Self> {
        check_elements(bytes.len(), element_bytes)?;
        Ok(Self { bytes, offset: 0, element_bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.element_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn element_bytes(&self) -> usize {
        self.element_bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.bytes
    }

    pub fn elements_mut(&mut self, start: usize, count: usize) -> &mut [u8] {
        &mut self.bytes[start * self.element_bytes..(start + count) * self.element_bytes]
    }

    /// Split into one window per range.
    ///
    /// `ranges` must be ascending and non-overlapping; gaps between them are
    /// dropped. This is how one output buffer becomes the disjoint per-lane
    /// destinations of a launch.
    pub fn split_lanes(self, ranges: &[Range<usize>]) -> Result<Vec<GlobalSliceMut<'a>>> {
        let Self { mut bytes, offset, element_bytes } = self;
        let len = bytes.len() / element_bytes;
        let mut consumed = 0;
        let mut windows = Vec::with_capacity(ranges.len());

        for range in ranges {
            check_window(range, len)?;
            ensure!(
                range.start >= consumed,
                InvalidViewSnafu { offset: range.start, size: range.len(), buffer_size: consumed }
            );

            let rest = std::mem::take(&mut bytes);
            let (_, rest) = rest.split_at_mut((range.start - consumed) * element_bytes);
            let (window, rest) = rest.split_at_mut(range.len() * element_bytes);
            bytes = rest;
            consumed = range.end;

            windows.push(GlobalSliceMut { bytes: window, offset: offset + range.start, element_bytes });
        }
        Ok(windows)
    }

    pub fn into_bytes(self) -> &'a mut [u8] {
        self.bytes
    }
}
