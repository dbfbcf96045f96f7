//! Per-lane streaming executor.
//!
//! Each lane runs its tiles through a bounded pipeline of `buffer_slots` scratch
//! slots. The inbound stage runs on a scoped producer thread; compute and the
//! outbound stage run on the calling thread:
//!
//! ```text
//!            slot 0          slot 1          slot 0
//! inbound  [ fill t0 ]     [ fill t1 ]     [ fill t2 ]...
//! compute             [ t0 -> out ]   [ t1 -> out ]   [ t2 -> out ]
//! ```
//!
//! `filled` counts tiles whose inbound copy completed, `drained` counts tiles
//! whose outbound copy completed. The producer may run at most `buffer_slots`
//! tiles ahead of `drained`, so a slot is never refilled before it is drained.
//!
//! # States
//!
//! `Idle → Filling(slot) → Computing(slot) → Draining(slot) → (Filling | Done)`

use std::time::Duration;

use lanetile_device::{CpuTimelineSignal, DmaEngine, ScratchPool, TimelineSignal};
use lanetile_schedule::{LaneTiling, TileSpan, TilingDescriptor};
use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, trace};

use crate::binding::{InputView, LaneInput, LaneOutput, OutputView};
use crate::error::{
    BindingMismatchSnafu, DeviceSnafu, Error, LaneOutOfRangeSnafu, Result, SlotTimeoutSnafu, TransferFailureSnafu,
};
use crate::kernel::{LaneContext, TileInfo, TileKernel};
use crate::launch::LaunchOptions;

/// Pipeline state of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneState {
    Idle,
    Filling { slot: usize },
    Computing { slot: usize },
    Draining { slot: usize },
    Done,
}

/// Summary of one completed lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneReport {
    pub lane: usize,
    pub elements: usize,
    pub tiles: usize,
    pub bytes_in: usize,
    pub bytes_out: usize,
}

/// Everything both pipeline stages of one lane read.
struct Pipeline<'p, 'a, K: ?Sized, D: ?Sized> {
    ctx: LaneContext,
    lane: LaneTiling,
    tile_capacity: usize,
    element_bytes: usize,
    buffer_slots: usize,
    timeout: Duration,
    kernel: &'p K,
    dma: &'p D,
    pool: ScratchPool,
    input: InputView<'a>,
    filled: CpuTimelineSignal,
    drained: CpuTimelineSignal,
}

/// Run every tile of lane `ctx.index` of `descriptor`.
///
/// `input` is the whole launch input; `output` is this lane's part of the launch
/// output (see [`bind_outputs`](crate::binding::bind_outputs)).
#[tracing::instrument(level = "debug", skip_all, fields(lane.index = ctx.index, lane.count = ctx.count))]
pub fn run_lane<K, D>(
    ctx: LaneContext,
    descriptor: &TilingDescriptor,
    kernel: &K,
    dma: &D,
    input: LaneInput<'_>,
    output: LaneOutput<'_>,
    options: &LaunchOptions,
) -> Result<LaneReport>
where
    K: TileKernel + ?Sized,
    D: DmaEngine + ?Sized,
{
    let plan = descriptor.plan();
    let lane = *plan.lane(ctx.index).context(LaneOutOfRangeSnafu { lane: ctx.index, lane_count: plan.lane_count() })?;
    ensure!(
        ctx.count == plan.lane_count(),
        BindingMismatchSnafu { what: "lane count", expected: plan.lane_count(), actual: ctx.count }
    );

    ensure!(
        descriptor.buffer_slots() > 0,
        BindingMismatchSnafu { what: "buffer slots", expected: 1usize, actual: 0usize }
    );

    ensure!(
        kernel.working_factor() <= descriptor.working_factor(),
        BindingMismatchSnafu {
            what: "kernel working factor",
            expected: descriptor.working_factor(),
            actual: kernel.working_factor(),
        }
    );

    let element_bytes = plan.element_bytes();
    if let Some(kernel_bytes) = kernel.element_bytes() {
        ensure!(
            kernel_bytes == element_bytes,
            BindingMismatchSnafu { what: "kernel element width", expected: element_bytes, actual: kernel_bytes }
        );
    }
    if let Some(span) = descriptor.boundaries().and_then(|boundaries| boundaries.lane_span(ctx.index)) {
        ensure!(
            span == lane.range(),
            BindingMismatchSnafu { what: "lane span start", expected: lane.start, actual: span.start }
        );
    }

    let input = InputView::bind(input, descriptor)?;
    let mut output = OutputView::bind(output, lane.elements, element_bytes)?;

    let tile_bytes = plan.tile_capacity() * element_bytes;
    let pipeline = Pipeline {
        ctx,
        lane,
        tile_capacity: plan.tile_capacity(),
        element_bytes,
        buffer_slots: descriptor.buffer_slots(),
        timeout: options.slot_timeout,
        kernel,
        dma,
        pool: ScratchPool::new(descriptor.buffer_slots(), tile_bytes * descriptor.working_factor()),
        input,
        filled: CpuTimelineSignal::new(),
        drained: CpuTimelineSignal::new(),
    };
    trace!(lane.index = ctx.index, state = ?LaneState::Idle, tiles = lane.iterations);

    let (produced, consumed) = std::thread::scope(|scope| {
        let producer = scope.spawn(|| pipeline.guard(pipeline.fill()));
        let consumed = pipeline.guard(pipeline.drain(&mut output));
        let produced = producer.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload));
        (produced, consumed)
    });

    let (bytes_in, bytes_out) = match (produced, consumed) {
        (Ok(bytes_in), Ok(bytes_out)) => (bytes_in, bytes_out),
        // The stage that failed first poisoned the other; report the original failure.
        (Err(err), Err(other)) if err.is_poisoned() => return Err(other),
        (Err(err), _) | (_, Err(err)) => return Err(err),
    };

    trace!(lane.index = ctx.index, state = ?LaneState::Done);
    debug!(lane.index = ctx.index, elements = lane.elements, tiles = lane.iterations, "lane complete");

    Ok(LaneReport { lane: ctx.index, elements: lane.elements, tiles: lane.iterations, bytes_in, bytes_out })
}

impl<K, D> Pipeline<'_, '_, K, D>
where
    K: TileKernel + ?Sized,
    D: DmaEngine + ?Sized,
{
    /// Poison both signals when a stage fails so that its peer stops waiting.
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.filled.poison();
            self.drained.poison();
        }
        result
    }

    fn wait(&self, signal: &CpuTimelineSignal, target: usize, tile: usize) -> Result<()> {
        signal.wait(target as u64, self.timeout).map_err(|source| match source {
            lanetile_device::Error::SignalTimeout { waited_ms, .. } => {
                SlotTimeoutSnafu { lane: self.ctx.index, tile, waited_ms }.build()
            }
            source => Error::Device { source },
        })
    }

    /// Inbound stage: global memory into free slots.
    fn fill(&self) -> Result<usize> {
        let mut bytes_in = 0;
        for tile in self.lane.tiles(self.tile_capacity) {
            if tile.index >= self.buffer_slots {
                self.wait(&self.drained, tile.index + 1 - self.buffer_slots, tile.index)?;
            }

            let slot_index = tile.index % self.buffer_slots;
            trace!(lane.index = self.ctx.index, tile = tile.index, state = ?LaneState::Filling { slot: slot_index });

            let mut slot = self.pool.slot(tile.index);
            let (mut dst, _) = slot.split_mut(tile.len * self.element_bytes).context(DeviceSnafu)?;
            self.input.for_each_run(self.lane.start + tile.offset, tile.len, |src| {
                let (head, rest) = std::mem::take(&mut dst).split_at_mut(src.len());
                dst = rest;
                self.dma
                    .copy_in(src, head)
                    .context(TransferFailureSnafu { lane: self.ctx.index, tile: tile.index })
            })?;
            drop(slot);

            bytes_in += tile.len * self.element_bytes;
            self.filled.set(tile.index as u64 + 1);
        }
        Ok(bytes_in)
    }

    /// Compute and outbound stages: filled slots back to global memory.
    fn drain(&self, output: &mut OutputView<'_>) -> Result<usize> {
        let mut bytes_out = 0;
        for tile in self.lane.tiles(self.tile_capacity) {
            self.wait(&self.filled, tile.index + 1, tile.index)?;

            let slot_index = tile.index % self.buffer_slots;
            let mut slot = self.pool.slot(tile.index);
            let (data, working) = slot.split_mut(tile.len * self.element_bytes).context(DeviceSnafu)?;

            trace!(lane.index = self.ctx.index, tile = tile.index, state = ?LaneState::Computing { slot: slot_index });
            self.kernel.apply(&self.ctx, &self.tile_info(&tile), data, working)?;

            trace!(lane.index = self.ctx.index, tile = tile.index, state = ?LaneState::Draining { slot: slot_index });
            let mut src: &[u8] = data;
            output.for_each_run(tile.offset, tile.len, |dst| {
                let (head, rest) = src.split_at(dst.len());
                src = rest;
                self.dma
                    .copy_out(head, dst)
                    .context(TransferFailureSnafu { lane: self.ctx.index, tile: tile.index })
            })?;
            drop(slot);

            bytes_out += tile.len * self.element_bytes;
            self.drained.set(tile.index as u64 + 1);
        }
        Ok(bytes_out)
    }

    fn tile_info(&self, tile: &TileSpan) -> TileInfo {
        TileInfo {
            index: tile.index,
            start: self.lane.start + tile.offset,
            len: tile.len,
            element_bytes: self.element_bytes,
        }
    }
}
