//! Capacity model properties over every element type.

use lanetile_dtype::ScalarDType;
use proptest::prelude::*;

use crate::capacity::CapacityModel;

proptest! {
    /// A full tile plus its widened working copy always fits in one slot.
    #[test]
    fn promoted_tile_fits_slot(
        dtype in any::<ScalarDType>(),
        alignment in prop::sample::select(vec![16usize, 32, 64]),
        blocks in 20usize..4096,
        slots in 1usize..=4,
    ) {
        let scratch = alignment * blocks;
        let model = CapacityModel::for_dtype(dtype, scratch, slots, alignment);
        let capacity = model.tile_capacity().unwrap();

        prop_assert!(capacity >= 1);
        prop_assert!(capacity * dtype.bytes() * dtype.working_buffer_factor() <= scratch / slots);
    }

    /// Widening never grows the tile.
    #[test]
    fn promotion_shrinks_capacity(dtype in any::<ScalarDType>(), blocks in 20usize..4096) {
        let promoted = CapacityModel::for_dtype(dtype, 32 * blocks, 2, 32).tile_capacity().unwrap();
        let plain = CapacityModel::builder()
            .element_bytes(dtype.bytes())
            .scratch_bytes(32 * blocks)
            .build()
            .tile_capacity()
            .unwrap();
        prop_assert!(promoted <= plain);
    }
}
