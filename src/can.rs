//!# CAN Controller device
//! [Controller] implements the SPI register protocol of the MCP2515: register access,
//! the initialization sequence, mode changes, filters and the frame transfer to and from
//! the hardware buffers. For shared access from application and interrupt context use
//! [crate::bus::Mcp2515].
//!
//!```
//!# use mcp2515::can::Controller;
//!# use mcp2515::config::{Configuration, Oscillator, Bitrate, RequestMode};
//!# use mcp2515::buffer::TxBuffer;
//!# use mcp2515::frame::CanFrame;
//!# use mcp2515::example::*;
//!# use embedded_can::{Frame, StandardId};
//!#
//! let clock = ExampleClock::default();
//! let mut controller: Controller<_, _, _, ExampleClock> =
//!     Controller::new(ExampleSPIBus::default(), ExampleCSPin {}, Oscillator::MHz8);
//!
//! let config = Configuration {
//!     mode: RequestMode::LoopBack,
//!     ..Configuration::with_bitrate(Bitrate::Kbps125)
//! };
//! controller.initialize(&config, &clock).unwrap();
//!
//! let frame = CanFrame::new(StandardId::new(0x123).unwrap(), &[0xAA, 0xBB]).unwrap();
//! controller.transmit(&frame, TxBuffer::TXB0).unwrap();
//!
//! assert_eq!(vec![frame], controller.poll().unwrap());
//! ```

use crate::buffer::{BufferStart, RxBuffer, TxBuffer};
use crate::config::{BitTiming, Bitrate, Configuration, Oscillator};
use crate::filter::{Filter, Mask};
use crate::frame::{CanFrame, MAX_PAYLOAD};
use crate::message::{DecodeError, EncodedFrame, ReceivedHeader, HEADER_LENGTH};
use crate::registers::{CanControlReg, Instruction, InterruptReg, Register, RxControlReg, TxControlReg};
use crate::status::{ErrorCounters, ErrorFlags, OperationMode, OperationStatus, ReadStatus, RxStatus};
use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt::Debug;
use core::marker::PhantomData;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_time::duration::Milliseconds;
use embedded_time::Clock;
use log::{debug, log_enabled, trace, Level};

/// Longest single exchange: instruction, address and 14 data bytes
const MAX_TRANSFER_LENGTH: usize = 16;

/// Settle time after reset in milliseconds
const RESET_SETTLE_TIME: u32 = 10;

/// Max. time for the chip to confirm a requested mode in milliseconds
const MODE_TIMEOUT: u32 = 2;

/// Max. time in milliseconds for pending transmissions to be aborted.
/// A frame already on the bus is sent completely, the longest one takes about 32 ms at 5 kbps.
const ABORT_TIMEOUT: u32 = 40;

/// Size of the TXBnCTRL..TXBnD7 block
const TX_BLOCK_LENGTH: usize = 14;

/// Errors of the SPI bus or the CS pin
#[derive(Debug, PartialEq)]
pub enum BusError<B, CS> {
    /// SPI transfer failed
    TransferError(B),
    /// Setting the CS pin failed
    CSError(CS),
}

/// Possible errors while configuring the controller
#[derive(Debug, PartialEq)]
pub enum ConfigError<B, CS> {
    /// Low level bus error
    BusError(BusError<B, CS>),
    /// Internal clock error
    ClockError,
    /// No configuration mode within timeout of 2 ms
    ConfigurationModeTimeout,
    /// Device did not enter given request mode within timeout of 2 ms
    RequestModeTimeout,
    /// No bit timing known for the oscillator/bit rate pair
    UnsupportedBitrate(Oscillator, Bitrate),
    /// Interrupt line is not readable or still active after clearing all interrupt flags
    InterruptLine,
    /// A previous initialization failed, the instance must be recreated
    InitializationFailed,
}

/// Possible errors during transmission and reception
#[derive(Debug, PartialEq)]
pub enum Error<B, CS> {
    /// Low level bus error
    BusError(BusError<B, CS>),
    /// Receive buffer holds a DLC above 8
    InvalidFrame(u8),
    /// Frame kind can not be transmitted by a classic CAN controller
    UnsupportedFrameKind,
    /// Buffer or filter number out of range
    ArgumentRange(u8),
    /// Internal clock error
    ClockError,
    /// Pending transmissions were not aborted within timeout
    AbortTimeout,
}

impl<B, CS> From<BusError<B, CS>> for ConfigError<B, CS> {
    fn from(value: BusError<B, CS>) -> Self {
        ConfigError::BusError(value)
    }
}

impl<B, CS> From<BusError<B, CS>> for Error<B, CS> {
    fn from(value: BusError<B, CS>) -> Self {
        Error::BusError(value)
    }
}

impl<B, CS> From<embedded_time::clock::Error> for ConfigError<B, CS> {
    fn from(_error: embedded_time::clock::Error) -> Self {
        ConfigError::ClockError
    }
}

impl<B, CS> From<embedded_time::clock::Error> for Error<B, CS> {
    fn from(_error: embedded_time::clock::Error) -> Self {
        Error::ClockError
    }
}

/// Interrupt line placeholder for controllers running in polling mode
#[derive(Copy, Clone, Debug, Default)]
pub struct NoInterrupt;

impl InputPin for NoInterrupt {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

/// Main MCP2515 CAN controller device
pub struct Controller<B: Transfer<u8>, CS: OutputPin, INT: InputPin, CLK: Clock> {
    /// SPI bus
    bus: B,

    /// CS pin
    pin_cs: CS,

    /// Active-low interrupt line, polling mode if `None`
    interrupt: Option<INT>,

    /// Crystal attached to the chip
    oscillator: Oscillator,

    /// Last mode reported by the chip
    mode: OperationMode,

    /// System clock
    clock: PhantomData<CLK>,
}

impl<B, CS, CLK> Controller<B, CS, NoInterrupt, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    CLK: Clock,
{
    /// Controller in polling mode
    pub fn new(bus: B, pin_cs: CS, oscillator: Oscillator) -> Self {
        Self::build(bus, pin_cs, None, oscillator)
    }
}

impl<B, CS, INT, CLK> Controller<B, CS, INT, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    INT: InputPin,
    CLK: Clock,
{
    /// Controller signalling received frames on the given active-low interrupt line
    pub fn with_interrupt(bus: B, pin_cs: CS, oscillator: Oscillator, interrupt: INT) -> Self {
        Self::build(bus, pin_cs, Some(interrupt), oscillator)
    }

    fn build(bus: B, pin_cs: CS, interrupt: Option<INT>, oscillator: Oscillator) -> Self {
        Self {
            bus,
            pin_cs,
            interrupt,
            oscillator,
            mode: OperationMode::Configuration,
            clock: Default::default(),
        }
    }

    /// Runs the full initialization sequence and enters the configured mode
    pub fn initialize(&mut self, config: &Configuration, clock: &CLK) -> Result<(), ConfigError<B::Error, CS::Error>> {
        let timing = BitTiming::lookup(self.oscillator, config.bitrate)
            .ok_or(ConfigError::UnsupportedBitrate(self.oscillator, config.bitrate))?;
        debug!("Bit timing for {:?} at {:?}: {timing:?}", config.bitrate, self.oscillator);

        self.reset()?;
        self.wait(clock, RESET_SETTLE_TIME)?;

        // Reset should enter configuration mode, but this is not guaranteed for all chip revisions
        let status = self.read_operation_status()?;
        if status.mode == OperationMode::Configuration {
            self.mode = OperationMode::Configuration;
        } else {
            self.enable_mode(OperationMode::Configuration, clock, ConfigError::ConfigurationModeTimeout)?;
        }

        self.clear_filters_and_masks()?;
        self.clear_control_buffers()?;
        self.configure_interrupts()?;

        // RXB0 rolls over into RXB1 if full
        self.modify_register(
            Register::RXB0CTRL,
            RxControlReg::MASK_SETUP,
            RxControlReg::new().with_bukt(true).into(),
        )?;
        self.modify_register(
            Register::RXB1CTRL,
            RxControlReg::MASK_SETUP,
            RxControlReg::new().with_filhit0(true).into(),
        )?;

        self.set_filter_enabled(false)?;

        self.write_registers(Register::CNF3.address(), &timing.as_registers())?;
        self.modify_register(
            Register::CANCTRL,
            CanControlReg::MASK_OPTIONS,
            config.as_control_options(),
        )?;

        self.log_registers()?;

        self.enable_mode(config.mode.to_operation_mode(), clock, ConfigError::RequestModeTimeout)?;
        debug!("Controller initialized: {config:?}");

        Ok(())
    }

    /// Requests the given mode and waits max. 2 ms for the chip to confirm it
    pub fn set_mode(&mut self, mode: OperationMode, clock: &CLK) -> Result<(), ConfigError<B::Error, CS::Error>> {
        let timeout_error = match mode {
            OperationMode::Configuration => ConfigError::ConfigurationModeTimeout,
            _ => ConfigError::RequestModeTimeout,
        };

        self.enable_mode(mode, clock, timeout_error)
    }

    /// Last mode confirmed by the chip. Use [Self::read_operation_status] for the current mode.
    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    /// Reads and returns the operation status
    pub fn read_operation_status(&mut self) -> Result<OperationStatus, BusError<B::Error, CS::Error>> {
        let data = self.read_register(Register::CANSTAT)?;

        Ok(OperationStatus::from_register(data))
    }

    /// Enters the given mode and waits max. 2 ms for the given mode to be reached
    fn enable_mode(
        &mut self,
        mode: OperationMode,
        clock: &CLK,
        timeout_error: ConfigError<B::Error, CS::Error>,
    ) -> Result<(), ConfigError<B::Error, CS::Error>> {
        let reqop = CanControlReg::new().with_reqop(mode as u8);
        self.modify_register(Register::CANCTRL, CanControlReg::MASK_REQOP, reqop.into())?;

        let target = clock
            .try_now()?
            .checked_add(Milliseconds::new(MODE_TIMEOUT))
            .ok_or(ConfigError::ClockError)?;

        loop {
            let current_mode = self.read_operation_status()?.mode;
            self.mode = current_mode;

            if current_mode == mode {
                return Ok(());
            }

            if clock.try_now()? > target {
                debug!("Device did not enter mode {mode:?} within timeout. Current mode: {current_mode:?}");
                return Err(timeout_error);
            }
        }
    }

    /// Busy waits the given time
    fn wait(&self, clock: &CLK, milliseconds: u32) -> Result<(), ConfigError<B::Error, CS::Error>> {
        let target = clock
            .try_now()?
            .checked_add(Milliseconds::new(milliseconds))
            .ok_or(ConfigError::ClockError)?;

        while clock.try_now()? < target {}

        Ok(())
    }

    /// Zeros all acceptance filters and masks
    pub fn clear_filters_and_masks(&mut self) -> Result<(), BusError<B::Error, CS::Error>> {
        // RXF0-RXF2 and RXF3-RXF5 are separated by CANSTAT/CANCTRL
        self.write_registers(Register::RXF0SIDH.address(), &[0u8; 12])?;
        self.write_registers(Register::RXF3SIDH.address(), &[0u8; 12])?;
        self.write_registers(Register::RXM0SIDH.address(), &[0u8; 8])?;

        Ok(())
    }

    /// Clears all transmit buffers and both receive control registers
    fn clear_control_buffers(&mut self) -> Result<(), BusError<B::Error, CS::Error>> {
        for buffer in TxBuffer::ALL {
            self.write_registers(buffer.control_register().address(), &[0u8; TX_BLOCK_LENGTH])?;
        }

        self.write_register(Register::RXB0CTRL, 0x0)?;
        self.write_register(Register::RXB1CTRL, 0x0)?;

        Ok(())
    }

    /// Enables the receive interrupts if an interrupt line is wired, otherwise disables all interrupts
    fn configure_interrupts(&mut self) -> Result<(), ConfigError<B::Error, CS::Error>> {
        if self.interrupt.is_none() {
            self.write_register(Register::CANINTE, InterruptReg::new().into())?;
            return Ok(());
        }

        self.write_register(Register::CANINTE, InterruptReg::new().with_rx0(true).with_rx1(true).into())?;
        self.clear_interrupt_flags(0xFF)?;

        if self.is_interrupt_pending().map_err(|_| ConfigError::InterruptLine)? {
            debug!("Interrupt line still active after clearing all interrupt flags");
            return Err(ConfigError::InterruptLine);
        }

        Ok(())
    }

    /// Enables or disables acceptance filtering for both receive buffers.
    /// If disabled, every message is received regardless of filters and masks.
    pub fn set_filter_enabled(&mut self, enabled: bool) -> Result<(), BusError<B::Error, CS::Error>> {
        let rxm = if enabled { 0 } else { RxControlReg::RXM_FILTER_OFF };
        let value = RxControlReg::new().with_rxm(rxm).into();

        self.modify_register(Register::RXB0CTRL, RxControlReg::MASK_RXM, value)?;
        self.modify_register(Register::RXB1CTRL, RxControlReg::MASK_RXM, value)?;

        Ok(())
    }

    /// Writes the given acceptance filter. Switches to configuration mode and back to the current mode.
    pub fn set_filter(&mut self, filter: &Filter, clock: &CLK) -> Result<(), ConfigError<B::Error, CS::Error>> {
        self.in_configuration_mode(clock, |controller| {
            controller.write_registers(filter.register(), &filter.as_registers())
        })
    }

    /// Writes the given acceptance mask. Switches to configuration mode and back to the current mode.
    pub fn set_mask(&mut self, mask: &Mask, clock: &CLK) -> Result<(), ConfigError<B::Error, CS::Error>> {
        self.in_configuration_mode(clock, |controller| {
            controller.write_registers(mask.register(), &mask.as_registers())
        })
    }

    fn in_configuration_mode<F>(&mut self, clock: &CLK, operation: F) -> Result<(), ConfigError<B::Error, CS::Error>>
    where
        F: FnOnce(&mut Self) -> Result<(), BusError<B::Error, CS::Error>>,
    {
        let previous_mode = self.read_operation_status()?.mode;

        if previous_mode != OperationMode::Configuration {
            self.enable_mode(OperationMode::Configuration, clock, ConfigError::ConfigurationModeTimeout)?;
        }

        operation(self)?;

        if previous_mode != OperationMode::Configuration {
            self.enable_mode(previous_mode, clock, ConfigError::RequestModeTimeout)?;
        }

        Ok(())
    }

    /// Loads the frame into the given transmit buffer and requests transmission
    pub fn transmit(&mut self, frame: &CanFrame, buffer: TxBuffer) -> Result<(), Error<B::Error, CS::Error>> {
        let encoded = EncodedFrame::encode(frame);

        // identifier, DLC and payload in one burst
        self.load_tx_buffer(buffer, BufferStart::Identifier, encoded.as_bytes())?;

        self.modify_register(
            buffer.control_register(),
            TxControlReg::MASK_TXREQ,
            TxControlReg::new().with_txreq(true).into(),
        )?;

        Ok(())
    }

    /// Returns true if the buffer still holds a message waiting for transmission
    pub fn is_tx_pending(&mut self, buffer: TxBuffer) -> Result<bool, BusError<B::Error, CS::Error>> {
        let control = TxControlReg::from(self.read_register(buffer.control_register())?);

        Ok(control.txreq())
    }

    /// Aborts all pending transmissions and waits max. 40 ms until all TXREQ bits are cleared.
    /// ABAT is reset afterwards, also on timeout.
    pub fn abort_all(&mut self, clock: &CLK) -> Result<(), Error<B::Error, CS::Error>> {
        let abat = CanControlReg::new().with_abat(true).into();
        self.modify_register(Register::CANCTRL, CanControlReg::MASK_ABAT, abat)?;

        let result = self.wait_tx_aborted(clock);

        self.modify_register(Register::CANCTRL, CanControlReg::MASK_ABAT, 0x0)?;

        result
    }

    fn wait_tx_aborted(&mut self, clock: &CLK) -> Result<(), Error<B::Error, CS::Error>> {
        let target = clock
            .try_now()?
            .checked_add(Milliseconds::new(ABORT_TIMEOUT))
            .ok_or(Error::ClockError)?;

        for buffer in TxBuffer::ALL {
            while self.is_tx_pending(buffer)? {
                if clock.try_now()? > target {
                    debug!("Transmission of {buffer:?} not aborted within timeout");
                    return Err(Error::AbortTimeout);
                }
            }
        }

        Ok(())
    }

    /// Decodes the frame held by the given receive buffer and releases the buffer afterwards
    pub fn receive(&mut self, buffer: RxBuffer) -> Result<CanFrame, Error<B::Error, CS::Error>> {
        let mut registers = [0u8; HEADER_LENGTH];
        self.read_registers(buffer.header_register().address(), &mut registers)?;

        let control = self.read_register(buffer.control_register())?;

        let header = ReceivedHeader::decode(registers, control).map_err(|error| match error {
            DecodeError::InvalidLength(dlc) => Error::InvalidFrame(dlc),
        })?;

        let mut data = [0u8; MAX_PAYLOAD];
        let length = header.payload_length();
        if length > 0 {
            self.read_registers(buffer.data_register().address(), &mut data[..length])?;
        }

        let frame = header.into_frame(&data[..length]);

        // Flag is cleared afterwards, as the chip may write the buffer again once released
        self.release_rx_buffer(buffer)?;

        Ok(frame)
    }

    /// Clears the receive flag of the buffer without reading it, e.g. to drop an invalid frame
    pub fn release_rx_buffer(&mut self, buffer: RxBuffer) -> Result<(), BusError<B::Error, CS::Error>> {
        self.clear_interrupt_flags(buffer.interrupt_flag())
    }

    /// Decodes all received frames in buffer order and passes them to the consumer.
    /// Returns the number of received frames.
    ///
    /// A buffer holding an invalid frame does not stop the other buffer from being read. Its flag is kept
    /// and [Error::InvalidFrame] is returned after all valid frames were passed to the consumer.
    /// Bus errors abort immediately.
    pub fn receive_pending<F>(&mut self, mut consumer: F) -> Result<usize, Error<B::Error, CS::Error>>
    where
        F: FnMut(CanFrame),
    {
        let flags = self.read_register(Register::CANINTF)?;
        let mut count = 0;
        let mut invalid = None;

        for buffer in RxBuffer::ALL {
            if flags & buffer.interrupt_flag() == 0 {
                continue;
            }

            match self.receive(buffer) {
                Ok(frame) => {
                    consumer(frame);
                    count += 1;
                }
                Err(Error::InvalidFrame(dlc)) => {
                    debug!("Invalid DLC {dlc} in {buffer:?}, buffer kept until released");
                    if invalid.is_none() {
                        invalid = Some(Error::InvalidFrame(dlc));
                    }
                }
                Err(error) => return Err(error),
            }
        }

        match invalid {
            Some(error) => Err(error),
            None => Ok(count),
        }
    }

    /// Returns all frames waiting in the receive buffers.
    ///
    /// If one buffer holds an invalid frame, the valid frames of this call are returned and the invalid
    /// buffer stays flagged. [Error::InvalidFrame] is returned as soon as no valid frame is left.
    pub fn poll(&mut self) -> Result<Vec<CanFrame>, Error<B::Error, CS::Error>> {
        let mut frames = Vec::with_capacity(RxBuffer::ALL.len());

        match self.receive_pending(|frame| frames.push(frame)) {
            Err(Error::InvalidFrame(_)) if !frames.is_empty() => Ok(frames),
            Err(error) => Err(error),
            Ok(_) => Ok(frames),
        }
    }

    /// Returns true if the interrupt line is active (low). Always false in polling mode.
    pub fn is_interrupt_pending(&self) -> Result<bool, INT::Error> {
        match &self.interrupt {
            None => Ok(false),
            Some(pin) => pin.is_low(),
        }
    }

    /// True if an interrupt line is wired
    pub fn has_interrupt(&self) -> bool {
        self.interrupt.is_some()
    }

    /// Reads the error flag register
    pub fn read_error_flags(&mut self) -> Result<ErrorFlags, BusError<B::Error, CS::Error>> {
        let data = self.read_register(Register::EFLG)?;

        Ok(ErrorFlags::from_register(data))
    }

    /// Reads the transmit and receive error counters
    pub fn read_error_counters(&mut self) -> Result<ErrorCounters, BusError<B::Error, CS::Error>> {
        let mut data = [0u8; 2];
        self.read_registers(Register::TEC.address(), &mut data)?;

        Ok(ErrorCounters {
            transmit: data[0],
            receive: data[1],
        })
    }

    /// Clears the given bits in CANINTF
    fn clear_interrupt_flags(&mut self, flags: u8) -> Result<(), BusError<B::Error, CS::Error>> {
        self.modify_register(Register::CANINTF, flags, 0x0)
    }

    /// Dumps the configuration registers on trace level
    fn log_registers(&mut self) -> Result<(), BusError<B::Error, CS::Error>> {
        if !log_enabled!(Level::Trace) {
            return Ok(());
        }

        let mut filters = [0u8; 12];
        self.read_registers(Register::RXF0SIDH.address(), &mut filters)?;
        trace!("RXF0SIDH: {filters:02X?}");

        self.read_registers(Register::RXF3SIDH.address(), &mut filters)?;
        trace!("RXF3SIDH: {filters:02X?}");

        let mut masks = [0u8; 8];
        self.read_registers(Register::RXM0SIDH.address(), &mut masks)?;
        trace!("RXM0SIDH: {masks:02X?}");

        let mut config = [0u8; 6];
        self.read_registers(Register::CNF3.address(), &mut config)?;
        trace!("CNF3..EFLG: {config:02X?}");

        Ok(())
    }

    /// Resets internal registers to default and switches to configuration mode
    pub fn reset(&mut self) -> Result<(), BusError<B::Error, CS::Error>> {
        let mut buffer = [Instruction::Reset as u8];
        self.transfer(&mut buffer)?;
        self.mode = OperationMode::Configuration;

        Ok(())
    }

    /// Reads a single register byte
    pub fn read_register(&mut self, register: Register) -> Result<u8, BusError<B::Error, CS::Error>> {
        let mut buffer = [Instruction::Read as u8, register.address(), 0x0];

        let response = self.transfer(&mut buffer)?;
        Ok(response[2])
    }

    /// Reads sequential registers starting at the given address until `data` is full
    pub fn read_registers(&mut self, address: u8, data: &mut [u8]) -> Result<(), BusError<B::Error, CS::Error>> {
        for (i, chunk) in data.chunks_mut(MAX_TRANSFER_LENGTH - 2).enumerate() {
            let mut buffer = [0u8; MAX_TRANSFER_LENGTH];
            buffer[0] = Instruction::Read as u8;
            buffer[1] = address.wrapping_add((i * (MAX_TRANSFER_LENGTH - 2)) as u8);

            let response = self.transfer(&mut buffer[..chunk.len() + 2])?;
            chunk.copy_from_slice(&response[2..]);
        }

        Ok(())
    }

    /// Writes a single register byte
    pub fn write_register(&mut self, register: Register, value: u8) -> Result<(), BusError<B::Error, CS::Error>> {
        let mut buffer = [Instruction::Write as u8, register.address(), value];
        self.transfer(&mut buffer)?;

        Ok(())
    }

    /// Writes sequential registers starting at the given address
    pub fn write_registers(&mut self, address: u8, data: &[u8]) -> Result<(), BusError<B::Error, CS::Error>> {
        for (i, chunk) in data.chunks(MAX_TRANSFER_LENGTH - 2).enumerate() {
            let mut buffer = [0u8; MAX_TRANSFER_LENGTH];
            buffer[0] = Instruction::Write as u8;
            buffer[1] = address.wrapping_add((i * (MAX_TRANSFER_LENGTH - 2)) as u8);
            buffer[2..chunk.len() + 2].copy_from_slice(chunk);

            self.transfer(&mut buffer[..chunk.len() + 2])?;
        }

        Ok(())
    }

    /// Changes the bits selected by `mask` to the bits of `value`, executed atomically by the chip
    pub fn modify_register(&mut self, register: Register, mask: u8, value: u8) -> Result<(), BusError<B::Error, CS::Error>> {
        let mut buffer = [Instruction::BitModify as u8, register.address(), mask, value];
        self.transfer(&mut buffer)?;

        Ok(())
    }

    /// Reads the quick status via READ STATUS instruction
    pub fn read_status(&mut self) -> Result<ReadStatus, BusError<B::Error, CS::Error>> {
        let mut buffer = [Instruction::ReadStatus as u8, 0x0];

        let response = self.transfer(&mut buffer)?;
        Ok(ReadStatus::from_register(response[1]))
    }

    /// Reads the receive status via RX STATUS instruction
    pub fn read_rx_status(&mut self) -> Result<RxStatus, BusError<B::Error, CS::Error>> {
        let mut buffer = [Instruction::RxStatus as u8, 0x0];

        let response = self.transfer(&mut buffer)?;
        Ok(RxStatus::from_register(response[1]))
    }

    /// Reads a receive buffer via READ RX BUFFER instruction.
    /// The chip clears the buffer's RXnIF flag when the transfer ends.
    ///
    /// One buffer holds max. 13 bytes (header and payload), bytes of `data` beyond are left untouched.
    /// Returns the number of bytes read.
    pub fn read_rx_buffer(
        &mut self,
        buffer: RxBuffer,
        start: BufferStart,
        data: &mut [u8],
    ) -> Result<usize, BusError<B::Error, CS::Error>> {
        let length = data.len().min(HEADER_LENGTH + MAX_PAYLOAD);
        let mut command = [0u8; HEADER_LENGTH + MAX_PAYLOAD + 1];
        command[0] = Instruction::ReadRxBuffer as u8 | (buffer.number() << 2) | ((start as u8) << 1);

        let response = self.transfer(&mut command[..length + 1])?;
        data[..length].copy_from_slice(&response[1..]);

        Ok(length)
    }

    /// Writes a transmit buffer via LOAD TX BUFFER instruction.
    /// Only the first 13 bytes (header and payload) fit into one buffer, returns the number of bytes written.
    pub fn load_tx_buffer(
        &mut self,
        buffer: TxBuffer,
        start: BufferStart,
        data: &[u8],
    ) -> Result<usize, BusError<B::Error, CS::Error>> {
        let length = data.len().min(HEADER_LENGTH + MAX_PAYLOAD);
        let mut command = [0u8; HEADER_LENGTH + MAX_PAYLOAD + 1];
        command[0] = Instruction::LoadTxBuffer as u8 | (buffer.number() << 1) | start as u8;
        command[1..length + 1].copy_from_slice(&data[..length]);

        self.transfer(&mut command[..length + 1])?;

        Ok(length)
    }

    /// Executes a SPI transfer with asserted CS pin. CS is released even if the transfer fails.
    fn transfer<'a>(&mut self, buffer: &'a mut [u8]) -> Result<&'a [u8], BusError<B::Error, CS::Error>> {
        self.pin_cs.set_low().map_err(BusError::CSError)?;

        let result = self.bus.transfer(buffer).map_err(BusError::TransferError);

        self.pin_cs.set_high().map_err(BusError::CSError)?;

        result
    }
}

impl<B, CS, INT, CLK> Debug for Controller<B, CS, INT, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    INT: InputPin,
    CLK: Clock,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("oscillator", &self.oscillator)
            .field("mode", &self.mode)
            .field("interrupt", &self.interrupt.is_some())
            .finish()
    }
}
