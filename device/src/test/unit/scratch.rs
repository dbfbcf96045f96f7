use crate::error::Error;
use crate::scratch::{SCRATCH_ALIGN, ScratchPool, ScratchSlot, cast_region_mut};

#[test]
fn test_slot_is_aligned_and_zeroed() {
    let slot = ScratchSlot::new(100);
    assert_eq!(slot.len(), 100);
    assert_eq!(slot.as_bytes().as_ptr() as usize % SCRATCH_ALIGN, 0);
    assert!(slot.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn test_split_rejects_oversized_region() {
    let mut slot = ScratchSlot::new(64);
    assert_eq!(slot.split_mut(72).unwrap_err(), Error::InvalidView { offset: 0, size: 72, buffer_size: 64 });

    let (head, tail) = slot.split_mut(64).unwrap();
    assert_eq!((head.len(), tail.len()), (64, 0));
}

#[test]
fn test_split_and_cast() {
    let mut slot = ScratchSlot::new(48);
    let (data, working) = slot.split_mut(16).unwrap();
    assert_eq!((data.len(), working.len()), (16, 32));

    cast_region_mut::<u32>(data).unwrap().fill(7);
    assert_eq!(&slot.as_bytes()[..16], bytemuck::cast_slice::<u32, u8>(&[7u32; 4]));
    assert!(slot.as_bytes()[16..].iter().all(|&b| b == 0));

    let err = cast_region_mut::<u32>(&mut [0u8; 6]).unwrap_err();
    assert_eq!(err, Error::ElementMisaligned { bytes: 6, element_bytes: 4 });
}

#[test]
fn test_pool_cycles_slots() {
    let pool = ScratchPool::new(2, 32);
    assert_eq!((pool.slot_count(), pool.slot_bytes()), (2, 32));

    pool.slot(0).as_bytes_mut().fill(1);
    pool.slot(1).as_bytes_mut().fill(2);
    assert!(pool.slot(2).as_bytes().iter().all(|&b| b == 1));
    assert!(pool.slot(3).as_bytes().iter().all(|&b| b == 2));
}
