use crate::frame::CanFrame;
use crate::message::{BufferHeader, DecodeError, EncodedFrame, ReceivedHeader, EXIDE_MASK, RXRTR_MASK};
use embedded_can::{ExtendedId, Frame, Id, StandardId};

const EXTENDED_ID: u32 = 0x14C92A2B;
const STANDARD_ID: u16 = 0x6A5;

/// Decodes the encoded frame the way it would appear in a receive buffer
fn loop_back(frame: &CanFrame) -> CanFrame {
    let encoded = EncodedFrame::encode(frame);
    let mut registers = [0u8; 5];
    registers.copy_from_slice(encoded.header());

    let control = if frame.is_remote_frame() { RXRTR_MASK } else { 0 };
    let header = ReceivedHeader::decode(registers, control).unwrap();

    header.into_frame(encoded.payload())
}

#[test]
fn test_encode_standard_id() {
    let frame = CanFrame::new(StandardId::new(0x123).unwrap(), &[0xAA, 0xBB]).unwrap();
    let encoded = EncodedFrame::encode(&frame);

    assert_eq!(&[0x24, 0x60, 0x00, 0x00, 0x02], encoded.header());
    assert_eq!(&[0xAA, 0xBB], encoded.payload());
}

#[test]
fn test_encode_extended_id() {
    let frame = CanFrame::new(ExtendedId::new(EXTENDED_ID).unwrap(), &[0u8; 8]).unwrap();
    let encoded = EncodedFrame::encode(&frame);

    assert_eq!(&[0xA6, 0x49, 0x2A, 0x2B, 0x08], encoded.header());
    assert_ne!(0, encoded.header()[1] & EXIDE_MASK);
    assert_eq!(13, encoded.as_bytes().len());
}

#[test]
fn test_header_fields() {
    let frame = CanFrame::new(ExtendedId::new(EXTENDED_ID).unwrap(), &[]).unwrap();
    let header = BufferHeader::from_frame(&frame);

    assert!(header.extended_identifier_enable());
    assert_eq!(0b101_0011_0010, header.standard_identifier());
    assert_eq!(0b01_0010_1010_0010_1011, header.extended_identifier());
    assert_eq!(0, header.data_length_code());

    let frame = CanFrame::new_remote(StandardId::new(STANDARD_ID).unwrap(), 3).unwrap();
    let header = BufferHeader::from_frame(&frame);

    assert!(!header.extended_identifier_enable());
    assert!(header.remote_transmission_request());
    assert_eq!(STANDARD_ID, header.standard_identifier());
    assert_eq!(3, header.data_length_code());
}

#[test]
fn test_encode_remote_request() {
    let frame = CanFrame::new_remote(ExtendedId::new(EXTENDED_ID).unwrap(), 6).unwrap();
    let encoded = EncodedFrame::encode(&frame);

    // RTR bit set, length is the requested one, no payload
    assert_eq!(0x46, encoded.header()[4]);
    assert!(encoded.payload().is_empty());
}

#[test]
fn test_decode_standard_id() {
    let header = ReceivedHeader::decode([0x24, 0x60, 0x00, 0x00, 0x02], 0x00).unwrap();

    assert_eq!(Id::Standard(StandardId::new(0x123).unwrap()), header.id);
    assert_eq!(2, header.dlc);
    assert!(!header.remote);
    assert_eq!(2, header.payload_length());
}

#[test]
fn test_decode_ignores_unused_bits() {
    // EID bits and RTR bit of a standard frame are ignored
    let header = ReceivedHeader::decode([0xD4, 0xA3, 0xFF, 0xFF, 0x41], 0x00).unwrap();

    assert_eq!(Id::Standard(StandardId::new(STANDARD_ID).unwrap()), header.id);
    assert_eq!(1, header.dlc);
}

#[test]
fn test_decode_extended_id() {
    let header = ReceivedHeader::decode([0xA6, 0x49, 0x2A, 0x2B, 0x08], 0x00).unwrap();

    assert_eq!(Id::Extended(ExtendedId::new(EXTENDED_ID).unwrap()), header.id);
    assert_eq!(8, header.dlc);
}

#[test]
fn test_decode_remote_request() {
    let header = ReceivedHeader::decode([0x24, 0x70, 0x00, 0x00, 0x05], RXRTR_MASK).unwrap();

    assert!(header.remote);
    assert_eq!(5, header.dlc);
    assert_eq!(0, header.payload_length());
    assert_eq!(
        CanFrame::new_remote(StandardId::new(0x123).unwrap(), 5).unwrap(),
        header.into_frame(&[])
    );
}

#[test]
fn test_decode_invalid_dlc() {
    for dlc in 9..=15 {
        assert_eq!(
            DecodeError::InvalidLength(dlc),
            ReceivedHeader::decode([0x24, 0x60, 0x00, 0x00, dlc], 0x00).unwrap_err()
        );
    }
}

#[test]
fn test_round_trip_standard() {
    let frames = [
        CanFrame::new(StandardId::ZERO, &[]).unwrap(),
        CanFrame::new(StandardId::MAX, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
        CanFrame::new(StandardId::new(STANDARD_ID).unwrap(), &[0xFF]).unwrap(),
        CanFrame::new_remote(StandardId::new(STANDARD_ID).unwrap(), 8).unwrap(),
    ];

    for frame in frames {
        assert_eq!(frame, loop_back(&frame));
    }
}

#[test]
fn test_round_trip_extended() {
    let frames = [
        CanFrame::new(ExtendedId::ZERO, &[0x01]).unwrap(),
        CanFrame::new(ExtendedId::MAX, &[0xAA; 8]).unwrap(),
        CanFrame::new(ExtendedId::new(EXTENDED_ID).unwrap(), &[1, 2, 3]).unwrap(),
        CanFrame::new_remote(ExtendedId::new(EXTENDED_ID).unwrap(), 0).unwrap(),
    ];

    for frame in frames {
        assert_eq!(frame, loop_back(&frame));
        assert_ne!(0, EncodedFrame::encode(&frame).header()[1] & EXIDE_MASK);
    }
}
