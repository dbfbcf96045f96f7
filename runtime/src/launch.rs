//! Launching a tiling plan across all lanes.
//!
//! Lanes share nothing mutable: the output is split into per-lane windows before
//! any lane starts, and every lane owns its scratch pool and timeline signals.
//! Any lane failure fails the launch as a whole.

use std::time::Duration;

use bon::bon;
use lanetile_device::DmaEngine;
use lanetile_schedule::{DEFAULT_SLOT_TIMEOUT_MS, DeviceProfile, TilingDescriptor};
use parking_lot::Mutex;
use snafu::OptionExt;
use tracing::{debug, warn};

use crate::binding::{LaneInput, OutputBuffers, bind_outputs};
use crate::error::{BindingMismatchSnafu, Error, Result};
use crate::executor::{LaneReport, run_lane};
use crate::kernel::{LaneContext, TileKernel};

/// Execution policy of a launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Upper bound on any single wait for a pipeline slot.
    pub slot_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from_profile(&DeviceProfile::default())
    }
}

#[bon]
impl LaunchOptions {
    #[builder]
    pub fn new(#[builder(default = DEFAULT_SLOT_TIMEOUT_MS)] slot_timeout_ms: u64) -> Self {
        Self { slot_timeout: Duration::from_millis(slot_timeout_ms) }
    }

    pub fn from_profile(profile: &DeviceProfile) -> Self {
        Self { slot_timeout: profile.slot_timeout }
    }
}

/// Per-lane reports of a completed launch, in lane order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchReport {
    pub lanes: Vec<LaneReport>,
}

impl LaunchReport {
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn total_elements(&self) -> usize {
        self.lanes.iter().map(|lane| lane.elements).sum()
    }

    pub fn total_tiles(&self) -> usize {
        self.lanes.iter().map(|lane| lane.tiles).sum()
    }

    pub fn bytes_moved(&self) -> usize {
        self.lanes.iter().map(|lane| lane.bytes_in + lane.bytes_out).sum()
    }
}

/// Run every lane of `descriptor` in parallel.
///
/// An empty plan is a no-op and returns an empty report. On failure the error
/// of the lowest failing lane is returned and the output contents are unspecified.
#[tracing::instrument(
    skip_all,
    fields(lanes = descriptor.plan().lane_count(), total = descriptor.plan().total_elements())
)]
pub fn launch<K, D>(
    descriptor: &TilingDescriptor,
    kernel: &K,
    dma: &D,
    input: LaneInput<'_>,
    output: OutputBuffers<'_>,
    options: &LaunchOptions,
) -> Result<LaunchReport>
where
    K: TileKernel + ?Sized,
    D: DmaEngine + ?Sized,
{
    let count = descriptor.plan().lane_count();
    if count == 0 {
        debug!("empty plan, nothing to launch");
        return Ok(LaunchReport::default());
    }

    let outputs = bind_outputs(descriptor, output)?;

    // Single lane fast path - no rayon overhead
    if count == 1 {
        let output = outputs.into_iter().next().context(BindingMismatchSnafu {
            what: "lane outputs",
            expected: 1usize,
            actual: 0usize,
        })?;
        let report = run_lane(LaneContext { index: 0, count }, descriptor, kernel, dma, input, output, options)?;
        return Ok(LaunchReport { lanes: vec![report] });
    }

    let reports: Mutex<Vec<LaneReport>> = Mutex::new(Vec::with_capacity(count));
    let errors: Mutex<Vec<(usize, Error)>> = Mutex::new(Vec::new());

    rayon::scope(|s| {
        for (index, output) in outputs.into_iter().enumerate() {
            let (reports, errors) = (&reports, &errors);
            s.spawn(move |_| {
                let ctx = LaneContext { index, count };
                match run_lane(ctx, descriptor, kernel, dma, input, output, options) {
                    Ok(report) => reports.lock().push(report),
                    Err(err) => errors.lock().push((index, err)),
                }
            });
        }
    });

    let mut errors = errors.into_inner();
    if !errors.is_empty() {
        errors.sort_by_key(|(lane, _)| *lane);
        warn!(failed = errors.len(), first = errors[0].0, "launch aborted");
        let (_, err) = errors.swap_remove(0);
        return Err(err);
    }

    let mut lanes = reports.into_inner();
    lanes.sort_by_key(|report| report.lane);
    debug!(lanes = lanes.len(), "launch complete");
    Ok(LaunchReport { lanes })
}
