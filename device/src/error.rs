use snafu::Snafu;

use crate::dma::TransferDirection;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("size mismatch: expected {expected}, got {actual}"))]
    SizeMismatch { expected: usize, actual: usize },

    /// Invalid view parameters.
    #[snafu(display("invalid view: offset {offset} + size {size} exceeds buffer size {buffer_size}"))]
    InvalidView { offset: usize, size: usize, buffer_size: usize },

    /// Buffer length is not a whole number of elements.
    #[snafu(display("buffer of {bytes} bytes is not a multiple of the {element_bytes}-byte element width"))]
    ElementMisaligned { bytes: usize, element_bytes: usize },

    /// A DMA-style copy did not complete.
    #[snafu(display("{direction} transfer of {bytes} bytes failed: {reason}"))]
    TransferFailed { direction: TransferDirection, bytes: usize, reason: String },

    #[snafu(display("timeline signal timeout: waited {waited_ms}ms for value {target}, current {current}"))]
    SignalTimeout { target: u64, current: u64, waited_ms: u64 },

    /// The peer stage failed and abandoned the signal.
    #[snafu(display("timeline signal poisoned while waiting for value {target}"))]
    Poisoned { target: u64 },
}
