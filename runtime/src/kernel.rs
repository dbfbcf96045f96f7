//! Per-tile compute functions.

use std::marker::PhantomData;

use bytemuck::Pod;
use lanetile_device::cast_region_mut;
use lanetile_dtype::HasDType;

use crate::error::{KernelSnafu, Result};

/// Identity of the lane a function runs on.
///
/// Passed explicitly to everything that needs it; there is no ambient lane id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneContext {
    pub index: usize,
    pub count: usize,
}

/// Position of one tile in the launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileInfo {
    /// Iteration index within the lane.
    pub index: usize,
    /// First element of the tile in the linear output index space.
    pub start: usize,
    pub len: usize,
    pub element_bytes: usize,
}

/// Operator compute function applied to each tile while it sits in scratch.
pub trait TileKernel: Send + Sync {
    /// Transform `data` (the tile's `tile.len` elements) in place.
    ///
    /// `working` is the rest of the slot: `descriptor.working_factor() - 1` tiles, which
    /// is never less than `working_factor() - 1`.
    fn apply(&self, ctx: &LaneContext, tile: &TileInfo, data: &mut [u8], working: &mut [u8]) -> Result<()>;

    /// Tile-sized regions the kernel needs in each slot.
    ///
    /// Lanes refuse to run a kernel needing more than the descriptor was planned for.
    fn working_factor(&self) -> usize {
        1
    }

    /// Element width the kernel is written for, if it is typed.
    fn element_bytes(&self) -> Option<usize> {
        None
    }
}

/// Maps `F` over every element of a tile of `T`.
pub struct ElementwiseKernel<T, F> {
    f: F,
    _element: PhantomData<fn(T) -> T>,
}

impl<T, F> ElementwiseKernel<T, F>
where
    T: HasDType + Pod,
    F: Fn(T) -> T + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, _element: PhantomData }
    }
}

impl<T, F> std::fmt::Debug for ElementwiseKernel<T, F>
where
    T: HasDType,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementwiseKernel").field("dtype", &T::DTYPE).finish()
    }
}

impl<T, F> TileKernel for ElementwiseKernel<T, F>
where
    T: HasDType + Pod,
    F: Fn(T) -> T + Send + Sync,
{
    fn apply(&self, ctx: &LaneContext, tile: &TileInfo, data: &mut [u8], _working: &mut [u8]) -> Result<()> {
        let elements = cast_region_mut::<T>(data)
            .map_err(|err| KernelSnafu { lane: ctx.index, tile: tile.index, reason: err.to_string() }.build())?;
        for element in elements {
            *element = (self.f)(*element);
        }
        Ok(())
    }

    fn element_bytes(&self) -> Option<usize> {
        Some(T::DTYPE.bytes())
    }
}

/// Leaves tiles untouched; the launch is then a pure copy (concatenation, split).
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl TileKernel for Identity {
    fn apply(&self, _ctx: &LaneContext, _tile: &TileInfo, _data: &mut [u8], _working: &mut [u8]) -> Result<()> {
        Ok(())
    }
}
