//!# CAN Filter
//! The MCP2515 has six acceptance filters and two masks. Filters 0 and 1 together with mask 0
//! belong to receive buffer 0, filters 2 to 5 together with mask 1 belong to receive buffer 1.
//!
//! Filtering is disabled after initialization, so every message is received. Once filters
//! are enabled a message is accepted if all identifier bits selected by the mask match the filter.
//!
//! ```
//!# use mcp2515::filter::{Filter, Mask};
//!# use embedded_can::{Id, ExtendedId};
//!
//! // ID to match
//! let id = Id::Extended(ExtendedId::new(0xC672).unwrap());
//! // Create filter with index 2 (receive buffer 1)
//! let filter = Filter::new(id, 2).unwrap();
//! // Only the upper byte of the extended ID needs to match
//! let mask = Mask::new_extended(1, 0xFF00).unwrap();
//!```
use embedded_can::{ExtendedId, Id, StandardId};
use modular_bitfield_msb::prelude::*;

/// Number of acceptance filters
pub const FILTER_COUNT: u8 = 6;

/// Number of acceptance masks
pub const MASK_COUNT: u8 = 2;

/// Layout of the RXFn and RXMn registers
#[bitfield]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct FilterReg {
    // SIDH, SIDL<7:5>
    pub standard_identifier: B11,
    #[skip]
    __: B1,
    /// Filter applies to extended frames only (filter registers only)
    pub exide: bool,
    #[skip]
    __: B1,
    // SIDL<1:0>, EID8, EID0
    pub extended_identifier: B18,
}

impl FilterReg {
    fn from_id(identifier: Id) -> Self {
        match identifier {
            Id::Standard(sid) => Self::new().with_standard_identifier(sid.as_raw()),
            Id::Extended(eid) => Self::new()
                .with_standard_identifier((eid.as_raw() >> 18) as u16 & 0x7FF)
                .with_extended_identifier(eid.as_raw() & 0x3FFFF)
                .with_exide(true),
        }
    }
}

/// Acceptance filter
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Filter index 0-5
    pub(crate) index: u8,
    /// filter register bitfield
    pub(crate) bits: FilterReg,
}

impl Filter {
    /// Creates a filter matching the given identifier, `None` if index exceeds 5
    pub fn new(identifier: Id, index: u8) -> Option<Self> {
        if index >= FILTER_COUNT {
            return None;
        }

        Some(Self {
            index,
            bits: FilterReg::from_id(identifier),
        })
    }

    /// Filter index
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Receive buffer the filter belongs to
    pub fn rx_buffer(&self) -> u8 {
        if self.index < 2 {
            0
        } else {
            1
        }
    }

    /// Address of the RXFnSIDH register
    pub(crate) fn register(&self) -> u8 {
        let base = if self.index < 3 { 0x00 } else { 0x10 };
        base + 4 * (self.index % 3)
    }

    pub(crate) fn as_registers(&self) -> [u8; 4] {
        self.bits.into_bytes()
    }
}

/// Acceptance mask, a set bit means the corresponding identifier bit must match the filter
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Mask {
    /// Mask index 0-1
    pub(crate) index: u8,
    /// mask register bitfield
    pub(crate) bits: FilterReg,
}

impl Mask {
    /// Mask for standard identifiers
    pub fn new_standard(index: u8, mask: u16) -> Option<Self> {
        Self::new(index, Id::Standard(StandardId::new(mask)?))
    }

    /// Mask for extended identifiers
    pub fn new_extended(index: u8, mask: u32) -> Option<Self> {
        Self::new(index, Id::Extended(ExtendedId::new(mask)?))
    }

    fn new(index: u8, identifier: Id) -> Option<Self> {
        if index >= MASK_COUNT {
            return None;
        }

        // the mask registers have no EXIDE bit
        Some(Self {
            index,
            bits: FilterReg::from_id(identifier).with_exide(false),
        })
    }

    /// Mask index
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Address of the RXMnSIDH register
    pub(crate) fn register(&self) -> u8 {
        0x20 + 4 * self.index
    }

    pub(crate) fn as_registers(&self) -> [u8; 4] {
        self.bits.into_bytes()
    }
}
