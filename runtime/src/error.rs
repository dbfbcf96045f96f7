//! Error types for lane execution.

use snafu::Snafu;

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while binding or running lanes.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Planning or descriptor error.
    #[snafu(display("schedule error: {source}"))]
    Schedule { source: lanetile_schedule::Error },

    /// Memory view or signal error outside a transfer.
    #[snafu(display("device error: {source}"))]
    Device { source: lanetile_device::Error },

    /// A DMA-style copy did not complete. Fatal for the whole launch.
    #[snafu(display("lane {lane}, tile {tile}: {source}"))]
    TransferFailure { lane: usize, tile: usize, source: lanetile_device::Error },

    /// A pipeline slot did not become available within the wait budget.
    #[snafu(display("lane {lane}, tile {tile}: no pipeline slot after {waited_ms}ms"))]
    SlotTimeout { lane: usize, tile: usize, waited_ms: u64 },

    #[snafu(display("lane {lane} out of range: plan has {lane_count} lanes"))]
    LaneOutOfRange { lane: usize, lane_count: usize },

    /// Buffers handed to a launch do not match the descriptor.
    #[snafu(display("{what} mismatch: descriptor expects {expected}, got {actual}"))]
    BindingMismatch { what: &'static str, expected: usize, actual: usize },

    /// The tile kernel rejected its input.
    #[snafu(display("kernel failed on lane {lane}, tile {tile}: {reason}"))]
    Kernel { lane: usize, tile: usize, reason: String },
}

impl Error {
    /// Lane the error was raised on, if it is lane-specific.
    pub fn lane(&self) -> Option<usize> {
        match self {
            Self::TransferFailure { lane, .. }
            | Self::SlotTimeout { lane, .. }
            | Self::LaneOutOfRange { lane, .. }
            | Self::Kernel { lane, .. } => Some(*lane),
            _ => None,
        }
    }

    /// Secondary failure of a pipeline stage whose peer already failed.
    pub(crate) fn is_poisoned(&self) -> bool {
        matches!(self, Self::Device { source: lanetile_device::Error::Poisoned { .. } })
    }
}
