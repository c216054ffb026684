use crate::registers::{CanControlReg, Cnf1Reg, Cnf2Reg, Cnf3Reg};
use crate::status::OperationMode;

/// Entire bus configuration applied during initialization
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Target bit rate of the CAN bus
    pub bitrate: Bitrate,

    /// Mode requested at the end of initialization
    pub mode: RequestMode,

    /// CLKOUT pin configuration
    pub clock_output: ClockOutput,

    /// Messages are only attempted once if set
    pub one_shot: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            bitrate: Bitrate::Kbps125,
            mode: RequestMode::Normal,
            clock_output: ClockOutput::Disabled,
            one_shot: false,
        }
    }
}

impl Configuration {
    /// Default configuration with the given bit rate
    pub fn with_bitrate(bitrate: Bitrate) -> Self {
        Self {
            bitrate,
            ..Self::default()
        }
    }

    /// Encodes the one-shot and clock output options to the lower CANCTRL bits
    pub(crate) fn as_control_options(&self) -> u8 {
        let mut register = CanControlReg::new().with_osm(self.one_shot);

        if let ClockOutput::Enabled(divisor) = self.clock_output {
            register.set_clken(true);
            register.set_clkpre(divisor as u8);
        }

        register.into()
    }
}

/// Oscillator (crystal) attached to the controller
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Oscillator {
    MHz8,
    MHz16,
    MHz20,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::MHz8
    }
}

impl Oscillator {
    /// Crystal frequency in Hz
    pub fn frequency(self) -> u32 {
        match self {
            Oscillator::MHz8 => 8_000_000,
            Oscillator::MHz16 => 16_000_000,
            Oscillator::MHz20 => 20_000_000,
        }
    }
}

/// Supported CAN bit rates
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bitrate {
    Kbps5,
    Kbps10,
    Kbps20,
    Kbps31_25,
    Kbps33_3,
    Kbps40,
    Kbps50,
    Kbps80,
    Kbps100,
    Kbps125,
    Kbps200,
    Kbps250,
    Kbps500,
    Kbps1000,
}

impl Bitrate {
    /// Nominal bit rate in bit/s, 33.3 kbps is rounded down
    pub fn bits_per_second(self) -> u32 {
        match self {
            Bitrate::Kbps5 => 5_000,
            Bitrate::Kbps10 => 10_000,
            Bitrate::Kbps20 => 20_000,
            Bitrate::Kbps31_25 => 31_250,
            Bitrate::Kbps33_3 => 33_333,
            Bitrate::Kbps40 => 40_000,
            Bitrate::Kbps50 => 50_000,
            Bitrate::Kbps80 => 80_000,
            Bitrate::Kbps100 => 100_000,
            Bitrate::Kbps125 => 125_000,
            Bitrate::Kbps200 => 200_000,
            Bitrate::Kbps250 => 250_000,
            Bitrate::Kbps500 => 500_000,
            Bitrate::Kbps1000 => 1_000_000,
        }
    }
}

/// Values of the three bit timing registers
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitTiming {
    /// SJW and baud rate prescaler
    pub cnf1: u8,
    /// BTLMODE, SAM, PHSEG1 and PRSEG
    pub cnf2: u8,
    /// SOF, WAKFIL and PHSEG2
    pub cnf3: u8,
}

impl BitTiming {
    /// Looks up the timing for the given oscillator and bit rate.
    /// Returns `None` if the combination is not achievable with the crystal.
    pub fn lookup(oscillator: Oscillator, bitrate: Bitrate) -> Option<Self> {
        use Bitrate::*;
        use Oscillator::*;

        let (cnf1, cnf2, cnf3) = match (oscillator, bitrate) {
            (MHz8, Kbps5) => (0xA7, 0xF6, 0x84),
            (MHz8, Kbps10) => (0x93, 0xF6, 0x84),
            (MHz8, Kbps20) => (0x89, 0xF6, 0x84),
            (MHz8, Kbps31_25) => (0x87, 0xE5, 0x83),
            (MHz8, Kbps33_3) => (0x85, 0xF6, 0x84),
            (MHz8, Kbps40) => (0x84, 0xF6, 0x84),
            (MHz8, Kbps50) => (0x84, 0xE5, 0x83),
            (MHz8, Kbps80) => (0x84, 0xD3, 0x81),
            (MHz8, Kbps100) => (0x81, 0xF6, 0x84),
            (MHz8, Kbps125) => (0x81, 0xE5, 0x83),
            (MHz8, Kbps200) => (0x80, 0xF6, 0x84),
            (MHz8, Kbps250) => (0x80, 0xE5, 0x83),
            (MHz8, Kbps500) => (0x00, 0xD1, 0x81),
            (MHz8, Kbps1000) => (0x00, 0xC0, 0x80),

            (MHz16, Kbps5) => (0x3F, 0xFF, 0x87),
            (MHz16, Kbps10) => (0x67, 0xF6, 0x84),
            (MHz16, Kbps20) => (0x53, 0xF6, 0x84),
            (MHz16, Kbps31_25) => (0x0F, 0xE5, 0x83),
            (MHz16, Kbps33_3) => (0x4E, 0xE5, 0x83),
            (MHz16, Kbps40) => (0x49, 0xF6, 0x84),
            (MHz16, Kbps50) => (0x47, 0xF6, 0x84),
            (MHz16, Kbps80) => (0x44, 0xF6, 0x84),
            (MHz16, Kbps100) => (0x44, 0xE5, 0x83),
            (MHz16, Kbps125) => (0x43, 0xE5, 0x83),
            (MHz16, Kbps200) => (0x41, 0xF6, 0x84),
            (MHz16, Kbps250) => (0x41, 0xE5, 0x83),
            (MHz16, Kbps500) => (0x40, 0xE5, 0x83),
            (MHz16, Kbps1000) => (0x00, 0xCA, 0x81),

            // 5 kbps would need more than 25 TQ per bit at the largest prescaler
            (MHz20, Kbps5) => return None,
            (MHz20, Kbps10) => (0x27, 0xFF, 0x87),
            (MHz20, Kbps20) => (0x13, 0xFF, 0x87),
            (MHz20, Kbps31_25) => (0x0F, 0xFA, 0x87),
            (MHz20, Kbps33_3) => (0x0B, 0xFF, 0x87),
            (MHz20, Kbps40) => (0x09, 0xFF, 0x87),
            (MHz20, Kbps50) => (0x09, 0xFA, 0x87),
            (MHz20, Kbps80) => (0x04, 0xFF, 0x87),
            (MHz20, Kbps100) => (0x04, 0xFA, 0x87),
            (MHz20, Kbps125) => (0x03, 0xFA, 0x87),
            (MHz20, Kbps200) => (0x01, 0xFF, 0x87),
            (MHz20, Kbps250) => (0x41, 0xFB, 0x86),
            (MHz20, Kbps500) => (0x00, 0xFA, 0x87),
            (MHz20, Kbps1000) => (0x00, 0xD9, 0x82),
        };

        Some(Self { cnf1, cnf2, cnf3 })
    }

    /// Baud rate prescaler, TQ = 2 * prescaler / F_osc
    pub fn prescaler(&self) -> u32 {
        Cnf1Reg::from(self.cnf1).brp() as u32 + 1
    }

    /// Number of time quanta per bit: sync, propagation, phase 1 and phase 2 segment
    pub fn time_quanta(&self) -> u32 {
        let cnf2 = Cnf2Reg::from(self.cnf2);
        let cnf3 = Cnf3Reg::from(self.cnf3);

        1 + (cnf2.prseg() as u32 + 1) + (cnf2.phseg1() as u32 + 1) + (cnf3.phseg2() as u32 + 1)
    }

    /// Resulting bit rate in bit/s for the given crystal
    pub fn bits_per_second(&self, oscillator: Oscillator) -> u32 {
        oscillator.frequency() / (2 * self.prescaler() * self.time_quanta())
    }

    /// Register bytes in address order, starting at CNF3
    pub(crate) fn as_registers(&self) -> [u8; 3] {
        [self.cnf3, self.cnf2, self.cnf1]
    }
}

/// Mode requested after initialization
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestMode {
    Normal,
    LoopBack,
    ListenOnly,
    Sleep,
}

impl RequestMode {
    pub(crate) fn to_operation_mode(self) -> OperationMode {
        match self {
            RequestMode::Normal => OperationMode::Normal,
            RequestMode::LoopBack => OperationMode::LoopBack,
            RequestMode::ListenOnly => OperationMode::ListenOnly,
            RequestMode::Sleep => OperationMode::Sleep,
        }
    }
}

/// CLKOUT pin configuration
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockOutput {
    Disabled,
    Enabled(ClockOutputDivisor),
}

/// Divisor for clock output
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockOutputDivisor {
    DivideBy1 = 0b00,
    DivideBy2 = 0b01,
    DivideBy4 = 0b10,
    DivideBy8 = 0b11,
}
