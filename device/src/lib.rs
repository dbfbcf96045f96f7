//! Device-side building blocks for lane execution.
//!
//! - [`sync`] - Timeline signals coupling the stages of a lane pipeline
//! - [`scratch`] - Aligned per-lane scratch slots
//! - [`memory`] - Validated windows into global memory
//! - [`dma`] - Copy engine between global memory and scratch

pub mod dma;
pub mod error;
pub mod memory;
pub mod scratch;
pub mod sync;


pub use dma::{CpuDma, DmaEngine, TransferDirection};
pub use error::{Error, Result};
pub use memory::{GlobalSlice, GlobalSliceMut};
pub use scratch::{SCRATCH_ALIGN, ScratchPool, ScratchSlot, cast_region_mut};
pub use sync::{CpuTimelineSignal, TimelineSignal};
