//! Tiling planner for lane-parallel scratch-buffer kernels.
//!
//! Computes, once per operator invocation, how a flat array of elements is split
//! across the parallel lanes of an accelerator and how each lane cuts its share
//! into tiles that fit its on-chip scratch buffer.
//!
//! # Module Organization
//!
//! - [`capacity`] - Elements per tile from scratch size, pipeline depth and alignment
//! - [`partition`] - Balanced, block-aligned lane partition and per-lane tiling
//! - [`boundary`] - Mapping of lane ranges onto multiple source arrays
//! - [`descriptor`] - Fixed-layout descriptor passed to the lanes
//! - [`config`] - Device profile (lane count, scratch size, alignment)
//! - [`request`] - Planning entry point ([`build_tiling_descriptor`])

pub mod boundary;
pub mod capacity;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod partition;
pub mod request;


pub use boundary::{BoundarySegment, Segments, SourceTable, map_boundaries};
pub use capacity::{CapacityModel, compute_tile_capacity};
pub use config::{DEFAULT_SLOT_TIMEOUT_MS, DeviceProfile};
pub use descriptor::{BoundaryTable, DESCRIPTOR_BYTES, TilingDescriptor};
pub use error::{Error, Result};
pub use partition::{LaneTiling, MAX_LANES, PartitionPlan, TileSpan};
pub use request::{TilingRequest, build_tiling_descriptor};
