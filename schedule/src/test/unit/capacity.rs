use test_case::test_case;

use lanetile_dtype::ScalarDType;

use crate::capacity::{CapacityModel, compute_tile_capacity};
use crate::error::Error;

const SCRATCH: usize = 192 * 1024;

#[test_case(4, SCRATCH, 2, 32 => 24576; "float32_double_buffered")]
#[test_case(2, SCRATCH, 2, 32 => 49152; "half_double_buffered")]
#[test_case(4, SCRATCH, 3, 32 => 16384; "triple_buffered")]
#[test_case(4, 4096, 1, 64 => 1024; "single_slot")]
#[test_case(8, 96, 2, 16 => 6; "slot_rounded_to_alignment")]
#[test_case(32, 64, 2, 32 => 1; "one_element_per_slot")]
fn test_tile_capacity(
    element_bytes: usize,
    scratch_bytes: usize,
    buffer_slots: usize,
    alignment_bytes: usize,
) -> usize {
    compute_tile_capacity(element_bytes, scratch_bytes, buffer_slots, alignment_bytes).unwrap()
}

#[test]
fn test_capacity_fits_scratch() {
    for element_bytes in [1usize, 2, 4, 8] {
        for buffer_slots in 1..=4 {
            let capacity = compute_tile_capacity(element_bytes, SCRATCH, buffer_slots, 32).unwrap();
            assert!(capacity * element_bytes * buffer_slots <= SCRATCH);
            assert_eq!(capacity * element_bytes % 32, 0, "tile bytes must stay aligned");
        }
    }
}

#[test_case(ScalarDType::Float32 => 24576; "float32_unpromoted")]
#[test_case(ScalarDType::Float16 => 16384; "half_reserves_float_copy")]
#[test_case(ScalarDType::Int8 => 32768; "int8_reserves_half_copy")]
#[test_case(ScalarDType::FP8E4M3 => 19648; "fp8_rounds_down_to_alignment")]
fn test_capacity_for_dtype(dtype: ScalarDType) -> usize {
    CapacityModel::for_dtype(dtype, SCRATCH, 2, 32).tile_capacity().unwrap()
}

#[test]
fn test_builder_defaults() {
    let model = CapacityModel::builder().element_bytes(4).scratch_bytes(SCRATCH).build();
    assert_eq!(model.buffer_slots, 2);
    assert_eq!(model.alignment_bytes, 32);
    assert_eq!(model.working_factor, 1);
    assert_eq!(model.slot_bytes().unwrap(), SCRATCH / 2);
}

#[test_case(0, 1024, 2, 32, 1, "element width is zero"; "zero_width")]
#[test_case(4, 1024, 0, 32, 1, "no buffer slots"; "zero_slots")]
#[test_case(4, 1024, 2, 0, 1, "alignment is zero"; "zero_alignment")]
#[test_case(4, 1024, 2, 32, 0, "working factor is zero"; "zero_factor")]
#[test_case(4, 1000, 2, 32, 1, "alignment does not divide scratch size"; "misaligned_scratch")]
#[test_case(4, 64, 4, 32, 1, "slot smaller than one aligned block"; "slot_below_alignment")]
#[test_case(4, 128, 2, 32, 3, "slot smaller than one aligned block"; "factor_shrinks_slot")]
fn test_invalid_capacity(
    element_bytes: usize,
    scratch_bytes: usize,
    buffer_slots: usize,
    alignment_bytes: usize,
    working_factor: usize,
    expected_reason: &str,
) {
    let model = CapacityModel { element_bytes, scratch_bytes, buffer_slots, alignment_bytes, working_factor };
    match model.tile_capacity() {
        Err(Error::InvalidCapacity { reason, .. }) => assert_eq!(reason, expected_reason),
        other => panic!("expected InvalidCapacity, got {other:?}"),
    }
}

#[test]
fn test_degenerate_capacity() {
    let err = compute_tile_capacity(64, 64, 2, 32).unwrap_err();
    assert_eq!(err, Error::DegenerateCapacity { element_bytes: 64, aligned_slot_bytes: 32 });
}
