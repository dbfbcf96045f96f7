//! Streaming execution of tiling plans.
//!
//! Runs an operator's per-tile compute function over every lane of a
//! [`TilingDescriptor`](lanetile_schedule::TilingDescriptor): each lane streams
//! its tiles from global memory through a bounded ring of scratch slots and
//! back, and all lanes run in parallel on rayon.
//!
//! # Example
//!
//! ```ignore
//! let request = TilingRequest::for_dtype(ScalarDType::Float32, input.len(), &DeviceProfile::host());
//! let descriptor = build_tiling_descriptor(&request)?;
//! let kernel = ElementwiseKernel::new(|x: f32| x * 2.0);
//!
//! launch(
//!     &descriptor,
//!     &kernel,
//!     &CpuDma,
//!     LaneInput::Linear(bytemuck::cast_slice(&input)),
//!     OutputBuffers::Linear(bytemuck::cast_slice_mut(&mut output)),
//!     &LaunchOptions::default(),
//! )?;
//! ```

pub mod binding;
pub mod error;
pub mod executor;
pub mod kernel;
pub mod launch;


pub use binding::{LaneInput, LaneOutput, OutputBuffers, bind_outputs};
pub use error::{Error, Result};
pub use executor::{LaneReport, LaneState, run_lane};
pub use kernel::{ElementwiseKernel, Identity, LaneContext, TileInfo, TileKernel};
pub use launch::{LaunchOptions, LaunchReport, launch};
