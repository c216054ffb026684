#![allow(unused_braces)]
use modular_bitfield_msb::prelude::*;

/// SPI instruction set
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Instruction {
    Reset = 0xC0,
    Read = 0x03,
    Write = 0x02,
    BitModify = 0x05,
    ReadStatus = 0xA0,
    RxStatus = 0xB0,
    /// Base opcode, buffer number and start position are OR'd in
    ReadRxBuffer = 0x90,
    /// Base opcode, buffer number and start position are OR'd in
    LoadTxBuffer = 0x40,
}

/// Register addresses of the MCP2515
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    RXF0SIDH = 0x00,
    RXF1SIDH = 0x04,
    RXF2SIDH = 0x08,
    BFPCTRL = 0x0C,
    TXRTSCTRL = 0x0D,
    CANSTAT = 0x0E,
    CANCTRL = 0x0F,
    RXF3SIDH = 0x10,
    RXF4SIDH = 0x14,
    RXF5SIDH = 0x18,
    TEC = 0x1C,
    REC = 0x1D,
    RXM0SIDH = 0x20,
    RXM1SIDH = 0x24,
    CNF3 = 0x28,
    CNF2 = 0x29,
    CNF1 = 0x2A,
    CANINTE = 0x2B,
    CANINTF = 0x2C,
    EFLG = 0x2D,
    TXB0CTRL = 0x30,
    TXB0SIDH = 0x31,
    TXB0DATA = 0x36,
    TXB1CTRL = 0x40,
    TXB1SIDH = 0x41,
    TXB1DATA = 0x46,
    TXB2CTRL = 0x50,
    TXB2SIDH = 0x51,
    TXB2DATA = 0x56,
    RXB0CTRL = 0x60,
    RXB0SIDH = 0x61,
    RXB0DATA = 0x66,
    RXB1CTRL = 0x70,
    RXB1SIDH = 0x71,
    RXB1DATA = 0x76,
}

impl Register {
    /// Address of the register
    pub fn address(self) -> u8 {
        self as u8
    }
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// CAN control register (CANCTRL)
pub struct CanControlReg {
    /// Request operation mode bits
    pub reqop: B3,
    /// Abort all pending transmissions bit
    pub abat: bool,
    /// One-shot mode bit
    pub osm: bool,
    /// CLKOUT pin enable bit
    pub clken: bool,
    /// CLKOUT pin prescaler bits
    pub clkpre: B2,
}

impl CanControlReg {
    pub const MASK_REQOP: u8 = 0b1110_0000;
    pub const MASK_ABAT: u8 = 0b0001_0000;
    /// One-shot and clock output bits
    pub const MASK_OPTIONS: u8 = 0b0000_1111;
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// CAN status register (CANSTAT)
pub struct CanStatusReg {
    /// Operation mode bits
    pub opmod: B3,
    #[skip]
    __: B1,
    /// Interrupt flag code bits
    pub icod: B3,
    #[skip]
    __: B1,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Interrupt enable register (CANINTE), bit order shared with CANINTF
pub struct InterruptReg {
    /// Message error interrupt
    pub merr: bool,
    /// Wake-up interrupt
    pub wak: bool,
    /// Error interrupt
    pub err: bool,
    /// Transmit buffer 2 empty interrupt
    pub tx2: bool,
    /// Transmit buffer 1 empty interrupt
    pub tx1: bool,
    /// Transmit buffer 0 empty interrupt
    pub tx0: bool,
    /// Receive buffer 1 full interrupt
    pub rx1: bool,
    /// Receive buffer 0 full interrupt
    pub rx0: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Transmit buffer control register (TXBnCTRL)
pub struct TxControlReg {
    #[skip]
    __: B1,
    /// Message aborted flag bit
    pub abtf: bool,
    /// Message lost arbitration bit
    pub mloa: bool,
    /// Transmission error detected bit
    pub txerr: bool,
    /// Message transmit request bit
    pub txreq: bool,
    #[skip]
    __: B1,
    /// Transmit buffer priority bits
    pub txp: B2,
}

impl TxControlReg {
    pub const MASK_TXREQ: u8 = 0b0000_1000;
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Receive buffer control register (RXB0CTRL/RXB1CTRL)
pub struct RxControlReg {
    #[skip]
    __: B1,
    /// Receive buffer operating mode bits
    pub rxm: B2,
    #[skip]
    __: B1,
    /// Received remote transfer request bit
    pub rxrtr: bool,
    /// Rollover enable (RXB0) or filter hit bit 2 (RXB1)
    pub bukt: bool,
    /// Read-only copy of BUKT (RXB0) or filter hit bit 1 (RXB1)
    pub bukt1: bool,
    /// Filter hit bit 0
    pub filhit0: bool,
}

impl RxControlReg {
    /// Receive buffer operating mode bits
    pub const MASK_RXM: u8 = 0b0110_0000;
    /// Bits touched by the receive buffer setup during initialization
    pub const MASK_SETUP: u8 = 0b0110_0111;
    /// RXM value turning masks and filters off
    pub const RXM_FILTER_OFF: u8 = 0b11;
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Configuration register 1
pub struct Cnf1Reg {
    /// Synchronization jump width bits
    pub sjw: B2,
    /// Baud rate prescaler bits
    pub brp: B6,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Configuration register 2
pub struct Cnf2Reg {
    /// PS2 bit time length bit
    pub btlmode: bool,
    /// Sample point configuration bit (three samples if set)
    pub sam: bool,
    /// PS1 length bits
    pub phseg1: B3,
    /// Propagation segment length bits
    pub prseg: B3,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Configuration register 3
pub struct Cnf3Reg {
    /// Start-of-frame signal bit
    pub sof: bool,
    /// Wake-up filter bit
    pub wakfil: bool,
    #[skip]
    __: B3,
    /// PS2 length bits
    pub phseg2: B3,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Error flag register (EFLG)
pub struct ErrorFlagReg {
    /// Receive buffer 1 overflow flag
    pub rx1ovr: bool,
    /// Receive buffer 0 overflow flag
    pub rx0ovr: bool,
    /// Bus-off error flag
    pub txbo: bool,
    /// Transmit error-passive flag
    pub txep: bool,
    /// Receive error-passive flag
    pub rxep: bool,
    /// Transmit error warning flag
    pub txwar: bool,
    /// Receive error warning flag
    pub rxwar: bool,
    /// Error warning flag
    pub ewarn: bool,
}
