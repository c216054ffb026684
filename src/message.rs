//!# Message codec
//! Translates [CanFrame]s to and from the register layout shared by the transmit and
//! receive buffers: `SIDH, SIDL, EIDH, EID0, DLC, D0..D7`.
//!
//! ```
//!# use mcp2515::frame::CanFrame;
//!# use mcp2515::message::EncodedFrame;
//!# use embedded_can::{Frame, StandardId};
//!#
//! let frame = CanFrame::new(StandardId::new(0x123).unwrap(), &[0xAA, 0xBB]).unwrap();
//! let encoded = EncodedFrame::encode(&frame);
//!
//! // SIDH, SIDL, EID8, EID0, DLC, payload
//! assert_eq!(&[0x24, 0x60, 0x00, 0x00, 0x02, 0xAA, 0xBB], encoded.as_bytes());
//! ```
use crate::frame::{CanFrame, Payload, MAX_PAYLOAD};
use embedded_can::{ExtendedId, Id, StandardId};
use log::debug;
use modular_bitfield_msb::prelude::*;

/// Identifier extension bit in SIDL
pub const EXIDE_MASK: u8 = 0x08;

/// Remote transmission request bit in the DLC register
pub const RTR_MASK: u8 = 0x40;

/// Data length code bits of the DLC register
pub const DLC_MASK: u8 = 0x0F;

/// Received remote transfer request bit in RXBnCTRL
pub const RXRTR_MASK: u8 = 0x08;

/// Number of identifier/DLC registers preceding the data registers
pub const HEADER_LENGTH: usize = 5;

const STANDARD_IDENTIFIER_MASK: u16 = 0x7FF;

const EXTENDED_IDENTIFIER_MASK: u32 = 0x3FFFF;

/// Identifier and DLC registers of a transmit or receive buffer
#[bitfield(bits = 40)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferHeader {
    // SIDH, SIDL<7:5>
    /// Standard identifier or 11 msb of the extended identifier
    pub standard_identifier: B11,
    /// Standard frame remote transmit request, only valid in receive buffers
    pub substitute_remote_request: bool,
    /// Set if the extended identifier is used
    pub extended_identifier_enable: bool,
    #[skip]
    __: B1,
    // SIDL<1:0>, EID8, EID0
    /// 18 lsb of the extended identifier
    pub extended_identifier: B18,
    // DLC
    #[skip]
    __: B1,
    /// Remote transmission request
    pub remote_transmission_request: bool,
    #[skip]
    __: B2,
    /// Data length code
    pub data_length_code: B4,
}

impl BufferHeader {
    /// Header for the given frame ready to be written to a transmit buffer
    pub fn from_frame(frame: &CanFrame) -> Self {
        let mut header = Self::new();

        match frame {
            CanFrame::StandardData { id, .. } | CanFrame::StandardRemote { id, .. } => {
                header.set_standard_identifier(id.as_raw());
            }
            CanFrame::ExtendedData { id, .. } | CanFrame::ExtendedRemote { id, .. } => {
                header.set_standard_identifier((id.as_raw() >> 18) as u16 & STANDARD_IDENTIFIER_MASK);
                header.set_extended_identifier(id.as_raw() & EXTENDED_IDENTIFIER_MASK);
                header.set_extended_identifier_enable(true);
            }
        }

        match frame {
            CanFrame::StandardData { payload, .. } | CanFrame::ExtendedData { payload, .. } => {
                header.set_data_length_code(payload.len() as u8);
            }
            CanFrame::StandardRemote { dlc, .. } | CanFrame::ExtendedRemote { dlc, .. } => {
                header.set_remote_transmission_request(true);
                header.set_data_length_code(*dlc);
            }
        }

        header
    }

    /// Identifier stored in the header
    pub fn id(&self) -> Id {
        if self.extended_identifier_enable() {
            let raw = ((self.standard_identifier() as u32) << 18) | self.extended_identifier();
            // 11 + 18 bits always fit into 29 bits
            Id::Extended(ExtendedId::new(raw).unwrap_or(ExtendedId::MAX))
        } else {
            Id::Standard(StandardId::new(self.standard_identifier()).unwrap_or(StandardId::MAX))
        }
    }
}

/// Register image of a frame for a transmit buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncodedFrame {
    buffer: [u8; HEADER_LENGTH + MAX_PAYLOAD],
    length: usize,
}

impl EncodedFrame {
    pub fn encode(frame: &CanFrame) -> Self {
        let mut buffer = [0u8; HEADER_LENGTH + MAX_PAYLOAD];
        buffer[..HEADER_LENGTH].copy_from_slice(&BufferHeader::from_frame(frame).into_bytes());

        let mut length = HEADER_LENGTH;
        if let CanFrame::StandardData { payload, .. } | CanFrame::ExtendedData { payload, .. } = frame {
            buffer[HEADER_LENGTH..HEADER_LENGTH + payload.len()].copy_from_slice(payload.as_slice());
            length += payload.len();
        }

        Self { buffer, length }
    }

    /// Identifier and DLC registers
    pub fn header(&self) -> &[u8] {
        &self.buffer[..HEADER_LENGTH]
    }

    /// Payload bytes, empty for remote frames
    pub fn payload(&self) -> &[u8] {
        &self.buffer[HEADER_LENGTH..self.length]
    }

    /// Header followed by payload
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.length]
    }
}

/// Decoded receive buffer header, pending payload read
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReceivedHeader {
    pub id: Id,
    pub remote: bool,
    pub dlc: u8,
}

/// Invalid receive buffer content
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// DLC above 8
    InvalidLength(u8),
}

impl ReceivedHeader {
    /// Decodes the five identifier/DLC registers and the RXBnCTRL register of a receive buffer
    pub fn decode(registers: [u8; HEADER_LENGTH], control: u8) -> Result<Self, DecodeError> {
        let header = BufferHeader::from_bytes(registers);
        let dlc = registers[HEADER_LENGTH - 1] & DLC_MASK;

        if dlc as usize > MAX_PAYLOAD {
            debug!("Received DLC of {dlc} exceeds {MAX_PAYLOAD} bytes");
            return Err(DecodeError::InvalidLength(dlc));
        }

        Ok(Self {
            id: header.id(),
            remote: control & RXRTR_MASK != 0,
            dlc,
        })
    }

    /// Number of payload bytes to be read from the data registers
    pub fn payload_length(&self) -> usize {
        if self.remote {
            0
        } else {
            self.dlc as usize
        }
    }

    /// Builds the frame, `data` must hold [Self::payload_length] bytes
    pub fn into_frame(self, data: &[u8]) -> CanFrame {
        let payload = Payload::new(&data[..self.payload_length().min(data.len())]).unwrap_or_default();

        match (self.id, self.remote) {
            (Id::Standard(id), false) => CanFrame::StandardData { id, payload },
            (Id::Standard(id), true) => CanFrame::StandardRemote { id, dlc: self.dlc },
            (Id::Extended(id), false) => CanFrame::ExtendedData { id, payload },
            (Id::Extended(id), true) => CanFrame::ExtendedRemote { id, dlc: self.dlc },
        }
    }
}
