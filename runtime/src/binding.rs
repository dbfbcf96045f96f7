//! Global memory bindings of a launch.
//!
//! Inputs are shared by all lanes and only read. Outputs are split up front into
//! one private window set per lane, so no two lanes can ever write the same byte.

use lanetile_device::{GlobalSlice, GlobalSliceMut};
use lanetile_schedule::{SourceTable, TilingDescriptor, map_boundaries};
use smallvec::SmallVec;
use snafu::{IntoError, ResultExt, ensure};

use crate::error::{BindingMismatchSnafu, DeviceSnafu, Result, ScheduleSnafu};

/// Read side of a launch.
#[derive(Debug, Clone, Copy)]
pub enum LaneInput<'a> {
    /// One contiguous input covering the whole linear index space.
    Linear(&'a [u8]),
    /// Source arrays laid end to end (concatenation).
    Gather(&'a [&'a [u8]]),
}

/// Write side of one lane.
#[derive(Debug)]
pub enum LaneOutput<'a> {
    /// This lane's window of a contiguous output.
    Linear(&'a mut [u8]),
    /// This lane's windows, one per boundary segment, in segment order (split).
    Scatter(Vec<&'a mut [u8]>),
}

/// Write side of a whole launch.
#[derive(Debug)]
pub enum OutputBuffers<'a> {
    Linear(&'a mut [u8]),
    /// Destination arrays laid end to end.
    Scatter(Vec<&'a mut [u8]>),
}

/// Input resolved against a plan, with bounds checked once.
#[derive(Debug)]
pub(crate) enum InputView<'a> {
    Linear(GlobalSlice<'a>),
    Gather { table: SourceTable, sources: SmallVec<[GlobalSlice<'a>; 8]> },
}

impl<'a> InputView<'a> {
    pub(crate) fn bind(input: LaneInput<'a>, descriptor: &TilingDescriptor) -> Result<Self> {
        let plan = descriptor.plan();
        let element_bytes = plan.element_bytes();

        match input {
            LaneInput::Linear(bytes) => {
                let slice = GlobalSlice::new(bytes, element_bytes).context(DeviceSnafu)?;
                let expected = plan.total_elements();
                ensure!(
                    slice.len() == expected,
                    BindingMismatchSnafu { what: "input elements", expected, actual: slice.len() }
                );
                Ok(Self::Linear(slice))
            }
            LaneInput::Gather(sources) => {
                let sources = sources
                    .iter()
                    .map(|bytes| GlobalSlice::new(bytes, element_bytes))
                    .collect::<lanetile_device::Result<SmallVec<[_; 8]>>>()
                    .context(DeviceSnafu)?;
                let lengths: SmallVec<[usize; 8]> = sources.iter().map(GlobalSlice::len).collect();
                let table = SourceTable::new(&lengths).context(ScheduleSnafu)?;
                check_sources(descriptor, table.source_count(), "input sources")?;
                let expected = plan.total_elements();
                ensure!(
                    table.total() == expected,
                    BindingMismatchSnafu { what: "input elements", expected, actual: table.total() }
                );
                Ok(Self::Gather { table, sources })
            }
        }
    }

    /// Bytes of `len` elements starting at linear `start`, as (source bytes) runs in order.
    pub(crate) fn for_each_run(
        &self,
        start: usize,
        len: usize,
        mut f: impl FnMut(&'a [u8]) -> Result<()>,
    ) -> Result<()> {
        match self {
            Self::Linear(slice) => f(slice.elements(start, len)),
            Self::Gather { table, sources } => {
                for segment in table.segments(start..start + len).context(ScheduleSnafu)? {
                    f(sources[segment.source_index].elements(segment.source_offset, segment.length))?;
                }
                Ok(())
            }
        }
    }
}

/// One lane's output resolved into element windows.
#[derive(Debug)]
pub(crate) struct OutputView<'a> {
    table: SourceTable,
    windows: SmallVec<[GlobalSliceMut<'a>; 4]>,
}

impl<'a> OutputView<'a> {
    pub(crate) fn bind(output: LaneOutput<'a>, lane_elements: usize, element_bytes: usize) -> Result<Self> {
        let windows: SmallVec<[GlobalSliceMut<'a>; 4]> = match output {
            LaneOutput::Linear(bytes) => {
                smallvec::smallvec![GlobalSliceMut::new(bytes, element_bytes).context(DeviceSnafu)?]
            }
            LaneOutput::Scatter(windows) => windows
                .into_iter()
                .map(|bytes| GlobalSliceMut::new(bytes, element_bytes))
                .collect::<lanetile_device::Result<_>>()
                .context(DeviceSnafu)?,
        };
        let lengths: SmallVec<[usize; 4]> = windows.iter().map(GlobalSliceMut::len).collect();
        let table = SourceTable::new(&lengths).context(ScheduleSnafu)?;
        ensure!(
            table.total() == lane_elements,
            BindingMismatchSnafu { what: "lane output elements", expected: lane_elements, actual: table.total() }
        );
        Ok(Self { table, windows })
    }

    /// Destination runs for `len` elements starting at lane-relative `offset`.
    pub(crate) fn for_each_run(
        &mut self,
        offset: usize,
        len: usize,
        mut f: impl FnMut(&mut [u8]) -> Result<()>,
    ) -> Result<()> {
        for segment in self.table.segments(offset..offset + len).context(ScheduleSnafu)? {
            f(self.windows[segment.source_index].elements_mut(segment.source_offset, segment.length))?;
        }
        Ok(())
    }
}

fn check_sources(descriptor: &TilingDescriptor, actual: usize, what: &'static str) -> Result<()> {
    if let Some(boundaries) = descriptor.boundaries() {
        ensure!(
            boundaries.source_count() == actual,
            BindingMismatchSnafu { what, expected: boundaries.source_count(), actual }
        );
    }
    Ok(())
}

/// Split the launch output into one disjoint [`LaneOutput`] per lane.
pub fn bind_outputs<'a>(descriptor: &TilingDescriptor, output: OutputBuffers<'a>) -> Result<Vec<LaneOutput<'a>>> {
    let plan = descriptor.plan();
    let element_bytes = plan.element_bytes();

    match output {
        OutputBuffers::Linear(bytes) => {
            let slice = GlobalSliceMut::new(bytes, element_bytes).context(DeviceSnafu)?;
            ensure!(
                slice.len() == plan.total_elements(),
                BindingMismatchSnafu { what: "output elements", expected: plan.total_elements(), actual: slice.len() }
            );
            let ranges: SmallVec<[_; 8]> = plan.lanes().iter().map(|lane| lane.range()).collect();
            let windows = slice.split_lanes(&ranges).context(DeviceSnafu)?;
            Ok(windows.into_iter().map(|window| LaneOutput::Linear(window.into_bytes())).collect())
        }
        OutputBuffers::Scatter(destinations) => {
            let mut remaining: Vec<&'a mut [u8]> = Vec::with_capacity(destinations.len());
            let mut lengths = Vec::with_capacity(destinations.len());
            for bytes in destinations {
                let slice = GlobalSliceMut::new(bytes, element_bytes).context(DeviceSnafu)?;
                lengths.push(slice.len());
                remaining.push(slice.into_bytes());
            }
            check_sources(descriptor, lengths.len(), "output destinations")?;

            let per_lane = map_boundaries(plan, &lengths).map_err(|err| match err {
                lanetile_schedule::Error::SourceLengthMismatch { expected, actual } => {
                    BindingMismatchSnafu { what: "output elements", expected, actual }.build()
                }
                source => ScheduleSnafu.into_error(source),
            })?;

            // Lanes walk each destination front to back, so every window is the
            // next unclaimed run of its destination.
            let mut lanes = Vec::with_capacity(per_lane.len());
            for segments in per_lane {
                let mut windows = Vec::with_capacity(segments.len());
                for segment in segments {
                    let rest = std::mem::take(&mut remaining[segment.source_index]);
                    let (window, rest) = rest.split_at_mut(segment.length * element_bytes);
                    remaining[segment.source_index] = rest;
                    windows.push(window);
                }
                lanes.push(LaneOutput::Scatter(windows));
            }
            Ok(lanes)
        }
    }
}
