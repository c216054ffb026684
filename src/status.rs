use crate::registers::{CanStatusReg, ErrorFlagReg};

/// Operation status read from CANSTAT register
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OperationStatus {
    /// Current operation mode
    pub mode: OperationMode,

    /// Source of the highest priority pending interrupt
    pub interrupt: InterruptCode,
}

impl OperationStatus {
    pub(crate) fn from_register(register: u8) -> Self {
        let reg = CanStatusReg::from(register);

        Self {
            mode: OperationMode::from_bits(reg.opmod()),
            interrupt: InterruptCode::from_bits(reg.icod()),
        }
    }
}

/// Operation mode as requested in CANCTRL and reported in CANSTAT
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperationMode {
    /// Normal operation on the bus
    Normal = 0b000,
    /// Module is in sleep mode
    Sleep = 0b001,
    /// Module is in internal loopback mode
    LoopBack = 0b010,
    /// Module is in listen-only mode
    ListenOnly = 0b011,
    /// Module is in configuration mode
    Configuration = 0b100,
}

impl OperationMode {
    /// Maps the three OPMOD/REQOP bits, invalid patterns are reported as configuration mode
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Normal,
            0b001 => Self::Sleep,
            0b010 => Self::LoopBack,
            0b011 => Self::ListenOnly,
            _ => Self::Configuration,
        }
    }
}

/// Interrupt flag code of CANSTAT
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InterruptCode {
    None,
    Error,
    WakeUp,
    TxBuffer0,
    TxBuffer1,
    TxBuffer2,
    RxBuffer0,
    RxBuffer1,
}

impl InterruptCode {
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::None,
            0b001 => Self::Error,
            0b010 => Self::WakeUp,
            0b011 => Self::TxBuffer0,
            0b100 => Self::TxBuffer1,
            0b101 => Self::TxBuffer2,
            0b110 => Self::RxBuffer0,
            _ => Self::RxBuffer1,
        }
    }
}

/// Quick status returned by the READ STATUS instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReadStatus {
    pub rx0_full: bool,
    pub rx1_full: bool,
    pub tx0_pending: bool,
    pub tx0_empty: bool,
    pub tx1_pending: bool,
    pub tx1_empty: bool,
    pub tx2_pending: bool,
    pub tx2_empty: bool,
}

impl ReadStatus {
    pub(crate) fn from_register(register: u8) -> Self {
        Self {
            rx0_full: register & 1 != 0,
            rx1_full: register & (1 << 1) != 0,
            tx0_pending: register & (1 << 2) != 0,
            tx0_empty: register & (1 << 3) != 0,
            tx1_pending: register & (1 << 4) != 0,
            tx1_empty: register & (1 << 5) != 0,
            tx2_pending: register & (1 << 6) != 0,
            tx2_empty: register & (1 << 7) != 0,
        }
    }
}

/// Result of the RX STATUS instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RxStatus {
    /// Received message in RXB0
    pub rx0_full: bool,
    /// Received message in RXB1
    pub rx1_full: bool,
    /// Last received message used an extended identifier
    pub extended: bool,
    /// Last received message was a remote frame
    pub remote: bool,
    /// Number of the filter that accepted the last message (0-5, RXF0/RXF1 rollover reported as 6/7)
    pub filter_hit: u8,
}

impl RxStatus {
    pub(crate) fn from_register(register: u8) -> Self {
        Self {
            rx0_full: register & (1 << 6) != 0,
            rx1_full: register & (1 << 7) != 0,
            extended: register & (1 << 4) != 0,
            remote: register & (1 << 3) != 0,
            filter_hit: register & 0b111,
        }
    }
}

/// Error state read from EFLG
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ErrorFlags {
    pub rx1_overflow: bool,
    pub rx0_overflow: bool,
    pub bus_off: bool,
    pub tx_error_passive: bool,
    pub rx_error_passive: bool,
    pub tx_warning: bool,
    pub rx_warning: bool,
    pub warning: bool,
}

impl ErrorFlags {
    pub(crate) fn from_register(register: u8) -> Self {
        let reg = ErrorFlagReg::from(register);

        Self {
            rx1_overflow: reg.rx1ovr(),
            rx0_overflow: reg.rx0ovr(),
            bus_off: reg.txbo(),
            tx_error_passive: reg.txep(),
            rx_error_passive: reg.rxep(),
            tx_warning: reg.txwar(),
            rx_warning: reg.rxwar(),
            warning: reg.ewarn(),
        }
    }
}

/// Transmit and receive error counters (TEC/REC)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ErrorCounters {
    pub transmit: u8,
    pub receive: u8,
}
