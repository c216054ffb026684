//!# CAN Frame
//! [CanFrame] covers the four frame kinds of CAN 2.0: standard or extended identifier,
//! each as data frame or remote transmission request.
//!
//! ```
//!# use mcp2515::frame::CanFrame;
//!# use embedded_can::{Frame, Id, StandardId};
//!#
//! let id = StandardId::new(0x123).unwrap();
//! let frame = CanFrame::new(id, &[0xAA, 0xBB]).unwrap();
//!
//! assert_eq!(Id::Standard(id), frame.id());
//! assert_eq!(&[0xAA, 0xBB], frame.data());
//! assert!(!frame.is_remote_frame());
//! ```
use embedded_can::{ExtendedId, Frame, Id, StandardId};

/// Maximum number of payload bytes of a CAN 2.0 frame
pub const MAX_PAYLOAD: usize = 8;

/// Payload of up to eight bytes
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload {
    length: u8,
    data: [u8; MAX_PAYLOAD],
}

impl Payload {
    /// Copies the given bytes, returns `None` if more than eight bytes are given
    pub fn new(data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD {
            return None;
        }

        let mut payload = Self {
            length: data.len() as u8,
            data: [0; MAX_PAYLOAD],
        };
        payload.data[..data.len()].copy_from_slice(data);

        Some(payload)
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len()]
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Classic CAN frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CanFrame {
    /// Data frame with 11 bit identifier
    StandardData { id: StandardId, payload: Payload },
    /// Remote transmission request with 11 bit identifier
    StandardRemote { id: StandardId, dlc: u8 },
    /// Data frame with 29 bit identifier
    ExtendedData { id: ExtendedId, payload: Payload },
    /// Remote transmission request with 29 bit identifier
    ExtendedRemote { id: ExtendedId, dlc: u8 },
}

/// Error when converting a foreign frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// Frame carries more than 8 data bytes or a DLC above 8 (e.g. CAN FD)
    UnsupportedFrameKind,
}

impl CanFrame {
    /// Copies any [embedded_can::Frame] implementation into a classic CAN frame
    pub fn from_frame<F: Frame>(frame: &F) -> Result<Self, FrameError> {
        let converted = if frame.is_remote_frame() {
            CanFrame::new_remote(frame.id(), frame.dlc())
        } else {
            CanFrame::new(frame.id(), frame.data())
        };

        converted.ok_or(FrameError::UnsupportedFrameKind)
    }

    /// Raw identifier value (11 or 29 bits)
    pub fn raw_id(&self) -> u32 {
        match self.id() {
            Id::Standard(id) => id.as_raw() as u32,
            Id::Extended(id) => id.as_raw(),
        }
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let payload = Payload::new(data)?;

        Some(match id.into() {
            Id::Standard(id) => CanFrame::StandardData { id, payload },
            Id::Extended(id) => CanFrame::ExtendedData { id, payload },
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_PAYLOAD {
            return None;
        }

        let dlc = dlc as u8;
        Some(match id.into() {
            Id::Standard(id) => CanFrame::StandardRemote { id, dlc },
            Id::Extended(id) => CanFrame::ExtendedRemote { id, dlc },
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self, CanFrame::ExtendedData { .. } | CanFrame::ExtendedRemote { .. })
    }

    fn is_remote_frame(&self) -> bool {
        matches!(self, CanFrame::StandardRemote { .. } | CanFrame::ExtendedRemote { .. })
    }

    fn id(&self) -> Id {
        match *self {
            CanFrame::StandardData { id, .. } | CanFrame::StandardRemote { id, .. } => Id::Standard(id),
            CanFrame::ExtendedData { id, .. } | CanFrame::ExtendedRemote { id, .. } => Id::Extended(id),
        }
    }

    fn dlc(&self) -> usize {
        match self {
            CanFrame::StandardData { payload, .. } | CanFrame::ExtendedData { payload, .. } => payload.len(),
            CanFrame::StandardRemote { dlc, .. } | CanFrame::ExtendedRemote { dlc, .. } => *dlc as usize,
        }
    }

    fn data(&self) -> &[u8] {
        match self {
            CanFrame::StandardData { payload, .. } | CanFrame::ExtendedData { payload, .. } => payload.as_slice(),
            CanFrame::StandardRemote { .. } | CanFrame::ExtendedRemote { .. } => &[],
        }
    }
}
