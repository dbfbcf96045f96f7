use crate::boundary::{BoundarySegment, SourceTable, map_boundaries};
use crate::error::Error;
use crate::partition::PartitionPlan;

fn seg(source_index: usize, source_offset: usize, length: usize) -> BoundarySegment {
    BoundarySegment { source_index, source_offset, length }
}

#[test]
fn test_lane_spanning_three_sources() {
    // Sources [10, 1, 3] over two lanes with 1-element blocks: 0..7 and 7..14.
    let plan = PartitionPlan::plan(14, 2, 4, 4, 4).unwrap();
    let lanes = map_boundaries(&plan, &[10, 1, 3]).unwrap();

    assert_eq!(lanes.len(), 2);
    assert_eq!(lanes[0].as_slice(), &[seg(0, 0, 7)]);
    assert_eq!(lanes[1].as_slice(), &[seg(0, 7, 3), seg(1, 0, 1), seg(2, 0, 3)]);
}

#[test]
fn test_block_aligned_split() {
    let plan = PartitionPlan::plan(14, 2, 4, 8, 4).unwrap();
    let lanes = map_boundaries(&plan, &[10, 1, 3]).unwrap();

    assert_eq!(lanes[0].as_slice(), &[seg(0, 0, 8)]);
    assert_eq!(lanes[1].as_slice(), &[seg(0, 8, 2), seg(1, 0, 1), seg(2, 0, 3)]);
}

#[test]
fn test_empty_sources_are_skipped() {
    let table = SourceTable::new(&[0, 4, 0, 0, 2, 0]).unwrap();
    assert_eq!(table.total(), 6);
    assert_eq!(table.source_count(), 6);

    let segments: Vec<_> = table.segments(0..6).unwrap().collect();
    assert_eq!(segments, vec![seg(1, 0, 4), seg(4, 0, 2)]);
}

#[test]
fn test_locate() {
    let table = SourceTable::new(&[3, 0, 2]).unwrap();
    assert_eq!(table.locate(0), Some(0));
    assert_eq!(table.locate(2), Some(0));
    assert_eq!(table.locate(3), Some(2));
    assert_eq!(table.locate(4), Some(2));
    assert_eq!(table.locate(5), None);
}

#[test]
fn test_segment_inside_one_source() {
    let table = SourceTable::new(&[100, 50]).unwrap();
    let segments: Vec<_> = table.segments(110..130).unwrap().collect();
    assert_eq!(segments, vec![seg(1, 10, 20)]);
    assert_eq!(segments[0].source_range(), 10..30);
}

#[test]
fn test_empty_range() {
    let table = SourceTable::new(&[5, 5]).unwrap();
    assert_eq!(table.segments(5..5).unwrap().count(), 0);
    assert_eq!(table.segments(10..10).unwrap().count(), 0);
}

#[test]
fn test_range_out_of_bounds() {
    let table = SourceTable::new(&[5, 5]).unwrap();
    assert_eq!(table.segments(8..12).unwrap_err(), Error::RangeOutOfBounds { start: 8, end: 12, total: 10 });
}

#[test]
fn test_length_mismatch() {
    let plan = PartitionPlan::plan(14, 2, 4, 4, 4).unwrap();
    assert_eq!(
        map_boundaries(&plan, &[10, 1, 2]).unwrap_err(),
        Error::SourceLengthMismatch { expected: 14, actual: 13 }
    );
}

#[test]
fn test_empty_plan_has_no_lanes() {
    let plan = PartitionPlan::plan(0, 4, 4, 4, 4).unwrap();
    assert!(map_boundaries(&plan, &[0, 0]).unwrap().is_empty());
}

#[test]
fn test_length_overflow() {
    assert_eq!(
        SourceTable::new(&[3, usize::MAX, 1]).unwrap_err(),
        Error::SourceLengthOverflow { source_index: 1, length: usize::MAX }
    );

    // A wrapped sum of zero must not pass for an empty plan.
    let plan = PartitionPlan::plan(0, 4, 4, 4, 4).unwrap();
    assert_eq!(
        map_boundaries(&plan, &[usize::MAX, 1]).unwrap_err(),
        Error::SourceLengthOverflow { source_index: 1, length: 1 }
    );
}
