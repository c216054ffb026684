use crate::registers::Register;

/// Transmit buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TxBuffer {
    TXB0 = 0,
    TXB1 = 1,
    TXB2 = 2,
}

impl TxBuffer {
    pub const ALL: [TxBuffer; 3] = [TxBuffer::TXB0, TxBuffer::TXB1, TxBuffer::TXB2];

    /// Buffer number 0-2
    pub fn number(self) -> u8 {
        self as u8
    }

    /// TXBnCTRL register
    pub fn control_register(self) -> Register {
        match self {
            TxBuffer::TXB0 => Register::TXB0CTRL,
            TxBuffer::TXB1 => Register::TXB1CTRL,
            TxBuffer::TXB2 => Register::TXB2CTRL,
        }
    }

    /// TXBnSIDH register, first register of the identifier block
    pub fn header_register(self) -> Register {
        match self {
            TxBuffer::TXB0 => Register::TXB0SIDH,
            TxBuffer::TXB1 => Register::TXB1SIDH,
            TxBuffer::TXB2 => Register::TXB2SIDH,
        }
    }

    /// TXBnD0 register
    pub fn data_register(self) -> Register {
        match self {
            TxBuffer::TXB0 => Register::TXB0DATA,
            TxBuffer::TXB1 => Register::TXB1DATA,
            TxBuffer::TXB2 => Register::TXB2DATA,
        }
    }
}

impl TryFrom<u8> for TxBuffer {
    /// The rejected buffer number
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TxBuffer::TXB0),
            1 => Ok(TxBuffer::TXB1),
            2 => Ok(TxBuffer::TXB2),
            _ => Err(value),
        }
    }
}

/// Receive buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RxBuffer {
    RXB0 = 0,
    RXB1 = 1,
}

impl RxBuffer {
    /// Buffers in the order they are drained
    pub const ALL: [RxBuffer; 2] = [RxBuffer::RXB0, RxBuffer::RXB1];

    /// Buffer number 0-1
    pub fn number(self) -> u8 {
        self as u8
    }

    /// RXBnCTRL register
    pub fn control_register(self) -> Register {
        match self {
            RxBuffer::RXB0 => Register::RXB0CTRL,
            RxBuffer::RXB1 => Register::RXB1CTRL,
        }
    }

    /// RXBnSIDH register, first register of the identifier block
    pub fn header_register(self) -> Register {
        match self {
            RxBuffer::RXB0 => Register::RXB0SIDH,
            RxBuffer::RXB1 => Register::RXB1SIDH,
        }
    }

    /// RXBnD0 register
    pub fn data_register(self) -> Register {
        match self {
            RxBuffer::RXB0 => Register::RXB0DATA,
            RxBuffer::RXB1 => Register::RXB1DATA,
        }
    }

    /// RXnIF bit in CANINTF
    pub fn interrupt_flag(self) -> u8 {
        1 << (self as u8)
    }
}

impl TryFrom<u8> for RxBuffer {
    /// The rejected buffer number
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RxBuffer::RXB0),
            1 => Ok(RxBuffer::RXB1),
            _ => Err(value),
        }
    }
}

/// Start position of the READ RX BUFFER and LOAD TX BUFFER instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferStart {
    /// Start at the SIDH register
    Identifier = 0,
    /// Start at the D0 register
    Data = 1,
}
