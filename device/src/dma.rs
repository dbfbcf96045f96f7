//! DMA-style transfers between global memory and scratch.
//!
//! The engine is the only component that moves bytes across the global/scratch
//! boundary. A failed transfer is fatal for the launch; engines never retry.

use snafu::ensure;

use crate::error::{Result, SizeMismatchSnafu};

/// Direction of a failed transfer, relative to the lane's scratch buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TransferDirection {
    /// Global memory into scratch.
    Inbound,
    /// Scratch back to global memory.
    Outbound,
}

/// Copy engine used by every lane of a launch.
pub trait DmaEngine: Send + Sync + std::fmt::Debug {
    /// Copy `src` (global) into `dst` (scratch). Lengths must match.
    fn copy_in(&self, src: &[u8], dst: &mut [u8]) -> Result<()>;

    /// Copy `src` (scratch) into `dst` (global). Lengths must match.
    fn copy_out(&self, src: &[u8], dst: &mut [u8]) -> Result<()>;
}

/// Host memcpy engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuDma;

impl CpuDma {
    fn copy(src: &[u8], dst: &mut [u8]) -> Result<()> {
        let expected = dst.len();
        let actual = src.len();
        ensure!(expected == actual, SizeMismatchSnafu { expected, actual });
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl DmaEngine for CpuDma {
    fn copy_in(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        Self::copy(src, dst)
    }

    fn copy_out(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        Self::copy(src, dst)
    }
}
