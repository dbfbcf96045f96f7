use test_case::test_case;

use crate::error::Error;
use crate::partition::{MAX_LANES, PartitionPlan, TileSpan, block_elements_for};
use crate::test::helpers::assert_plan_invariants;

fn lane_sizes(plan: &PartitionPlan) -> Vec<usize> {
    plan.lanes().iter().map(|lane| lane.elements).collect()
}

#[test]
fn test_remainder_goes_to_leading_lanes() {
    // 100 f32 elements, 16-byte alignment => 4-element blocks, 25 of them over 8 lanes.
    let plan = PartitionPlan::plan(100, 8, 16, 16, 4).unwrap();

    assert_eq!(plan.block_elements(), 4);
    assert_eq!(plan.remainder_lanes(), 1);
    assert_eq!(plan.large_lane_elements(), 16);
    assert_eq!(plan.small_lane_elements(), 12);
    assert_eq!(lane_sizes(&plan), vec![16, 12, 12, 12, 12, 12, 12, 12]);
    assert_eq!(plan.lane_range(1), Some(16..28));
    assert_eq!(plan.lane_range(7), Some(88..100));
    assert_plan_invariants(&plan, 8);
}

#[test]
fn test_empty_input() {
    let plan = PartitionPlan::plan(0, 8, 16, 32, 4).unwrap();
    assert!(plan.is_empty());
    assert_eq!(plan.lane_count(), 0);
    assert_eq!(plan.total_tiles(), 0);
    assert_eq!(plan.lane(0), None);
}

#[test]
fn test_single_tile_uses_one_lane() {
    let plan = PartitionPlan::plan(5, 8, 16, 32, 4).unwrap();
    assert_eq!(plan.lane_count(), 1);
    let lane = plan.lane(0).unwrap();
    assert_eq!((lane.start, lane.elements, lane.iterations, lane.tail), (0, 5, 1, 5));
}

#[test]
fn test_exact_fit_has_full_tail() {
    let plan = PartitionPlan::plan(48, 1, 16, 4, 4).unwrap();
    let lane = plan.lane(0).unwrap();
    assert_eq!((lane.iterations, lane.tail), (3, 16));
}

#[test]
fn test_tiles_of_a_lane() {
    let plan = PartitionPlan::plan(50, 1, 16, 4, 4).unwrap();
    let lane = plan.lane(0).unwrap();
    assert_eq!((lane.iterations, lane.tail), (4, 2));

    let tiles: Vec<TileSpan> = lane.tiles(plan.tile_capacity()).collect();
    assert_eq!(
        tiles,
        vec![
            TileSpan { index: 0, offset: 0, len: 16 },
            TileSpan { index: 1, offset: 16, len: 16 },
            TileSpan { index: 2, offset: 32, len: 16 },
            TileSpan { index: 3, offset: 48, len: 2 },
        ]
    );
}

#[test]
fn test_partial_block_goes_to_final_lane() {
    // 10 elements in 4-element blocks: two whole blocks and a 2-element leftover.
    let plan = PartitionPlan::plan(10, 8, 1, 16, 4).unwrap();
    assert_eq!(lane_sizes(&plan), vec![4, 4, 2]);
    assert_eq!(plan.remainder_lanes(), 2);
    assert_plan_invariants(&plan, 8);
}

#[test]
fn test_small_input_uses_fewer_lanes() {
    let plan = PartitionPlan::plan(24, 48, 4, 32, 4).unwrap();
    assert_eq!(lane_sizes(&plan), vec![8, 8, 8]);
    assert_eq!(plan.total_tiles(), 6);
}

#[test_case(1000, 48, 64, 32, 4; "many_lanes")]
#[test_case(1001, 7, 10, 8, 2; "odd_total")]
#[test_case(12345, 64, 100, 64, 1; "max_lanes")]
#[test_case(33, 4, 2, 4, 8; "wide_elements")]
fn test_plan_invariants(total: usize, lanes: usize, capacity: usize, align: usize, elem: usize) {
    let plan = PartitionPlan::plan(total, lanes, capacity, align, elem).unwrap();
    assert_plan_invariants(&plan, lanes);
}

#[test]
fn test_lane_count_errors() {
    assert_eq!(PartitionPlan::plan(100, 0, 16, 32, 4).unwrap_err(), Error::NoLanes);
    assert!(matches!(PartitionPlan::plan(100, 8, 0, 32, 4), Err(Error::DegenerateCapacity { .. })));
}

#[test_case(10, 1; "tiny_input")]
#[test_case(1_000_000, MAX_LANES; "large_input")]
#[test_case(400, 50; "fewer_blocks_than_lanes")]
fn test_more_physical_lanes_than_descriptor_holds(total: usize, expected_lanes: usize) {
    let plan = PartitionPlan::plan(total, 2 * MAX_LANES, 16, 32, 4).unwrap();
    assert_eq!(plan.lane_count(), expected_lanes);
    assert_plan_invariants(&plan, 2 * MAX_LANES);
}

#[test_case(32, 4 => 8; "float32")]
#[test_case(32, 1 => 32; "bytes")]
#[test_case(4, 8 => 1; "element_wider_than_alignment")]
#[test_case(32, 0 => 1; "zero_width")]
fn test_block_elements(alignment_bytes: usize, element_bytes: usize) -> usize {
    block_elements_for(alignment_bytes, element_bytes)
}
