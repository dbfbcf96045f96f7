use crate::error::Error;
use crate::memory::{GlobalSlice, GlobalSliceMut};

#[test]
fn test_slice_elements() {
    let data: Vec<u8> = (0..40).collect();
    let slice = GlobalSlice::new(&data, 4).unwrap();
    assert_eq!((slice.len(), slice.element_bytes()), (10, 4));
    assert_eq!(slice.elements(3, 1), &[12, 13, 14, 15]);
    assert_eq!(slice.elements(2, 3), &data[8..20]);
    assert!(slice.elements(10, 0).is_empty());
    assert!(GlobalSlice::new(&[], 8).unwrap().is_empty());
}

#[test]
fn test_slice_rejects_bad_views() {
    let data = [0u8; 10];
    assert_eq!(GlobalSlice::new(&data, 4).unwrap_err(), Error::ElementMisaligned { bytes: 10, element_bytes: 4 });
    assert!(matches!(GlobalSlice::new(&data, 0), Err(Error::ElementMisaligned { .. })));
    assert!(matches!(GlobalSliceMut::new(&mut [0u8; 7], 2), Err(Error::ElementMisaligned { bytes: 7, .. })));
}

#[test]
fn test_split_lanes() {
    let mut data = vec![0u8; 20];
    let slice = GlobalSliceMut::new(&mut data, 2).unwrap();
    let mut lanes = slice.split_lanes(&[0..4, 4..7, 7..10]).unwrap();

    assert_eq!(lanes.iter().map(GlobalSliceMut::len).collect::<Vec<_>>(), vec![4, 3, 3]);
    assert_eq!(lanes[2].offset(), 7);
    for (index, lane) in lanes.iter_mut().enumerate() {
        let len = lane.len();
        lane.elements_mut(0, len).fill(index as u8 + 1);
    }
    drop(lanes);

    assert_eq!(&data[..8], &[1; 8]);
    assert_eq!(&data[8..14], &[2; 6]);
    assert_eq!(&data[14..], &[3; 6]);
}

#[test]
fn test_split_lanes_with_gap() {
    let mut data = vec![0u8; 10];
    let lanes = GlobalSliceMut::new(&mut data, 1).unwrap().split_lanes(&[1..3, 6..10]).unwrap();
    assert_eq!(lanes[0].offset(), 1);
    assert_eq!(lanes[1].len(), 4);
}

#[test]
fn test_split_lanes_rejects_overlap() {
    let mut data = vec![0u8; 10];
    let err = GlobalSliceMut::new(&mut data, 1).unwrap().split_lanes(&[0..5, 4..10]).unwrap_err();
    assert!(matches!(err, Error::InvalidView { offset: 4, .. }));

    let mut data = vec![0u8; 10];
    let err = GlobalSliceMut::new(&mut data, 1).unwrap().split_lanes(&[0..5, 5..11]).unwrap_err();
    assert_eq!(err, Error::InvalidView { offset: 5, size: 6, buffer_size: 10 });
}
