//! Hardware limits the planner targets.
//!
//! Provides a typed device profile with a bon builder and environment variable
//! fallbacks.

use std::time::Duration;

use bon::bon;

use crate::capacity::{DEFAULT_ALIGNMENT_BYTES, DEFAULT_BUFFER_SLOTS};
use crate::partition::MAX_LANES;

/// Physical limits of the lane array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Number of physical lanes available to one launch.
    pub physical_lanes: usize,
    /// On-chip scratch buffer per lane, in bytes.
    pub scratch_bytes: usize,
    /// DMA transfer granularity, in bytes.
    pub alignment_bytes: usize,
    /// Pipeline depth.
    pub buffer_slots: usize,
    /// Upper bound on any single wait for a pipeline slot or transfer.
    pub slot_timeout: Duration,
}

const DEFAULT_PHYSICAL_LANES: usize = 48;
const DEFAULT_SCRATCH_BYTES: usize = 192 * 1024;

/// Default bound on one wait for a pipeline slot, in milliseconds.
pub const DEFAULT_SLOT_TIMEOUT_MS: u64 = 1000;

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            physical_lanes: DEFAULT_PHYSICAL_LANES,
            scratch_bytes: DEFAULT_SCRATCH_BYTES,
            alignment_bytes: DEFAULT_ALIGNMENT_BYTES,
            buffer_slots: DEFAULT_BUFFER_SLOTS,
            slot_timeout: Duration::from_millis(DEFAULT_SLOT_TIMEOUT_MS),
        }
    }
}

/// Host thread count, capped to what a descriptor can describe.
fn host_lanes() -> usize {
    std::thread::available_parallelism().map(|p| p.get()).unwrap_or(8).min(MAX_LANES)
}

#[bon]
impl DeviceProfile {
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_PHYSICAL_LANES)] physical_lanes: usize,
        #[builder(default = DEFAULT_SCRATCH_BYTES)] scratch_bytes: usize,
        #[builder(default = DEFAULT_ALIGNMENT_BYTES)] alignment_bytes: usize,
        #[builder(default = DEFAULT_BUFFER_SLOTS)] buffer_slots: usize,
        #[builder(default = DEFAULT_SLOT_TIMEOUT_MS)] slot_timeout_ms: u64,
    ) -> Self {
        let slot_timeout = Duration::from_millis(slot_timeout_ms);
        Self { physical_lanes, scratch_bytes, alignment_bytes, buffer_slots, slot_timeout }
    }

    /// Profile for running lanes as host threads.
    pub fn host() -> Self {
        Self { physical_lanes: host_lanes(), ..Default::default() }
    }

    /// Create a profile from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `LANETILE_LANES` - Physical lane count (default: 48)
    /// * `LANETILE_SCRATCH_BYTES` - Scratch buffer per lane (default: 196608)
    /// * `LANETILE_ALIGN_BYTES` - Transfer alignment (default: 32)
    /// * `LANETILE_BUFFER_SLOTS` - Pipeline depth (default: 2)
    /// * `LANETILE_SLOT_TIMEOUT_MS` - Slot wait budget in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`DeviceProfile::from_env`], reading variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).and_then(|s| s.trim().parse::<u64>().ok());
        let defaults = Self::default();

        Self {
            physical_lanes: read("LANETILE_LANES").map_or(defaults.physical_lanes, |v| v as usize),
            scratch_bytes: read("LANETILE_SCRATCH_BYTES").map_or(defaults.scratch_bytes, |v| v as usize),
            alignment_bytes: read("LANETILE_ALIGN_BYTES").map_or(defaults.alignment_bytes, |v| v as usize),
            buffer_slots: read("LANETILE_BUFFER_SLOTS").map_or(defaults.buffer_slots, |v| v as usize),
            slot_timeout: read("LANETILE_SLOT_TIMEOUT_MS").map_or(defaults.slot_timeout, Duration::from_millis),
        }
    }
}
