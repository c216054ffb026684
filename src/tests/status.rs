use crate::status::{ErrorFlags, InterruptCode, OperationMode, OperationStatus, ReadStatus, RxStatus};
use OperationMode::{Configuration, ListenOnly, LoopBack, Normal, Sleep};

#[test]
fn test_operation_status_from_register() {
    assert_eq!(Normal, OperationStatus::from_register(0b0000_0000).mode);
    assert_eq!(Sleep, OperationStatus::from_register(0b0010_0000).mode);
    assert_eq!(LoopBack, OperationStatus::from_register(0b0100_0000).mode);
    assert_eq!(ListenOnly, OperationStatus::from_register(0b0110_0000).mode);
    assert_eq!(Configuration, OperationStatus::from_register(0b1000_0000).mode);

    // invalid mode patterns
    assert_eq!(Configuration, OperationStatus::from_register(0b1010_0000).mode);
    assert_eq!(Configuration, OperationStatus::from_register(0b1110_0000).mode);
}

#[test]
fn test_interrupt_code() {
    assert_eq!(InterruptCode::None, OperationStatus::from_register(0b1000_0000).interrupt);
    assert_eq!(InterruptCode::Error, OperationStatus::from_register(0b1000_0010).interrupt);
    assert_eq!(InterruptCode::WakeUp, OperationStatus::from_register(0b1000_0100).interrupt);
    assert_eq!(InterruptCode::TxBuffer0, OperationStatus::from_register(0b1000_0110).interrupt);
    assert_eq!(InterruptCode::TxBuffer2, OperationStatus::from_register(0b1000_1010).interrupt);
    assert_eq!(InterruptCode::RxBuffer1, OperationStatus::from_register(0b0000_1110).interrupt);
}

#[test]
fn test_read_status() {
    let status = ReadStatus::from_register(0b1010_0110);

    assert!(!status.rx0_full);
    assert!(status.rx1_full);
    assert!(status.tx0_pending);
    assert!(!status.tx0_empty);
    assert!(!status.tx1_pending);
    assert!(status.tx1_empty);
    assert!(!status.tx2_pending);
    assert!(status.tx2_empty);
}

#[test]
fn test_rx_status() {
    let status = RxStatus::from_register(0b0100_0101);

    assert!(status.rx0_full);
    assert!(!status.rx1_full);
    assert!(!status.extended);
    assert!(!status.remote);
    assert_eq!(5, status.filter_hit);
}

#[test]
fn test_error_flags() {
    let flags = ErrorFlags::from_register(0b1100_0110);

    assert!(flags.rx1_overflow);
    assert!(flags.rx0_overflow);
    assert!(!flags.bus_off);
    assert!(!flags.tx_error_passive);
    assert!(!flags.rx_error_passive);
    assert!(flags.tx_warning);
    assert!(flags.rx_warning);
    assert!(!flags.warning);
}
