use test_case::test_case;

use crate::dma::{CpuDma, DmaEngine, TransferDirection};
use crate::error::Error;

#[test_case(TransferDirection::Inbound; "inbound")]
#[test_case(TransferDirection::Outbound; "outbound")]
fn test_cpu_dma_copies(direction: TransferDirection) {
    let src = [1u8, 2, 3, 4];
    let mut dst = [0u8; 4];
    match direction {
        TransferDirection::Inbound => CpuDma.copy_in(&src, &mut dst),
        TransferDirection::Outbound => CpuDma.copy_out(&src, &mut dst),
    }
    .unwrap();
    assert_eq!(dst, src);
}

#[test]
fn test_cpu_dma_empty_copy() {
    CpuDma.copy_in(&[], &mut []).unwrap();
}

#[test]
fn test_cpu_dma_length_mismatch() {
    let mut dst = [0u8; 3];
    assert_eq!(CpuDma.copy_out(&[1, 2, 3, 4], &mut dst).unwrap_err(), Error::SizeMismatch { expected: 3, actual: 4 });
    assert_eq!(dst, [0; 3]);
}

#[test]
fn test_direction_display() {
    assert_eq!(TransferDirection::Inbound.to_string(), "inbound");
    let err = Error::TransferFailed { direction: TransferDirection::Outbound, bytes: 64, reason: "link down".into() };
    assert_eq!(err.to_string(), "outbound transfer of 64 bytes failed: link down");
}
