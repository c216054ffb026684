//!# Shared CAN bus
//! [Mcp2515] owns the [Controller] behind a `critical_section` mutex, so the bus can be shared
//! between application code and an interrupt handler. The bus is initialized once by
//! [Mcp2515::create_can_bus], which hands out lightweight [CanBus] handles.
//!
//!```
//!# use mcp2515::bus::Mcp2515;
//!# use mcp2515::config::{Bitrate, Configuration, Oscillator, RequestMode};
//!# use mcp2515::frame::CanFrame;
//!# use mcp2515::example::*;
//!# use embedded_can::{Frame, StandardId};
//!#
//! let spi_bus = ExampleSPIBus::default();
//! let interrupt = spi_bus.interrupt_pin();
//! let clock = ExampleClock::default();
//!
//! let mcp2515 = Mcp2515::with_interrupt(spi_bus, ExampleCSPin {}, Oscillator::MHz8, interrupt);
//! let config = Configuration {
//!     mode: RequestMode::LoopBack,
//!     ..Configuration::with_bitrate(Bitrate::Kbps500)
//! };
//! let can = mcp2515.create_can_bus_with(&config, &clock).unwrap();
//!
//! can.on_frame_received(|frame: &CanFrame| {
//!     assert_eq!(&[0x01, 0x02], frame.data());
//! });
//!
//! let frame = CanFrame::new(StandardId::new(0x7FF).unwrap(), &[0x01, 0x02]).unwrap();
//! can.send(&frame, 0).unwrap();
//!
//! // usually called by the interrupt handler
//! assert_eq!(1, can.handle_interrupt().unwrap());
//! ```
use crate::buffer::{RxBuffer, TxBuffer};
use crate::can::{BusError, ConfigError, Controller, Error, NoInterrupt};
use crate::config::{Bitrate, Configuration, Oscillator, RequestMode};
use crate::filter::{Filter, Mask};
use crate::frame::CanFrame;
use crate::status::{ErrorCounters, ErrorFlags, OperationStatus, RxStatus};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use critical_section::Mutex;
use embedded_can::Frame;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_time::Clock;
use log::{debug, warn};

/// Callback receiving frames decoded by [CanBus::handle_interrupt]
pub type FrameHandler = Box<dyn FnMut(&CanFrame) + Send>;

/// Lifecycle of the bus
#[derive(Copy, Clone, Debug, PartialEq)]
enum BusState {
    Uninitialized,
    Ready(Configuration),
    /// Initialization failed, the chip state is unknown
    Failed,
}

/// MCP2515 device shared between application and interrupt context
pub struct Mcp2515<B, CS, INT, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    INT: InputPin,
    CLK: Clock,
{
    controller: Mutex<RefCell<Controller<B, CS, INT, CLK>>>,
    handler: Mutex<RefCell<Option<FrameHandler>>>,
    state: Mutex<Cell<BusState>>,
}

impl<B, CS, CLK> Mcp2515<B, CS, NoInterrupt, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    CLK: Clock,
{
    /// Device in polling mode, frames are fetched by [CanBus::poll]
    pub fn new(bus: B, pin_cs: CS, oscillator: Oscillator) -> Self {
        Self::from_controller(Controller::new(bus, pin_cs, oscillator))
    }
}

impl<B, CS, INT, CLK> Mcp2515<B, CS, INT, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    INT: InputPin,
    CLK: Clock,
{
    /// Device signalling received frames on the given active-low interrupt line
    pub fn with_interrupt(bus: B, pin_cs: CS, oscillator: Oscillator, interrupt: INT) -> Self {
        Self::from_controller(Controller::with_interrupt(bus, pin_cs, oscillator, interrupt))
    }

    fn from_controller(controller: Controller<B, CS, INT, CLK>) -> Self {
        Self {
            controller: Mutex::new(RefCell::new(controller)),
            handler: Mutex::new(RefCell::new(None)),
            state: Mutex::new(Cell::new(BusState::Uninitialized)),
        }
    }

    /// Initializes the bus with the given bit rate and default options
    pub fn create_can_bus(
        &self,
        bitrate: Bitrate,
        clock: &CLK,
    ) -> Result<CanBus<'_, B, CS, INT, CLK>, ConfigError<B::Error, CS::Error>> {
        self.create_can_bus_with(&Configuration::with_bitrate(bitrate), clock)
    }

    /// Initializes the bus on first call. Subsequent calls return a handle to the same bus
    /// without touching the chip, a failed initialization is reported on every later call.
    ///
    /// Initialization runs inside a critical section, including the 10 ms reset settle time.
    pub fn create_can_bus_with(
        &self,
        config: &Configuration,
        clock: &CLK,
    ) -> Result<CanBus<'_, B, CS, INT, CLK>, ConfigError<B::Error, CS::Error>> {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs);

            match state.get() {
                BusState::Ready(current) => {
                    if current != *config {
                        debug!("Bus already initialized with {current:?}, ignoring {config:?}");
                    }
                }
                BusState::Failed => return Err(ConfigError::InitializationFailed),
                BusState::Uninitialized => {
                    let result = self.controller.borrow_ref_mut(cs).initialize(config, clock);

                    if let Err(error) = result {
                        warn!("CAN bus initialization failed, device needs to be recreated");
                        state.set(BusState::Failed);
                        return Err(error);
                    }

                    state.set(BusState::Ready(*config));
                }
            }

            Ok(CanBus { owner: self })
        })
    }

    /// Active configuration, `None` if not initialized
    pub fn configuration(&self) -> Option<Configuration> {
        match critical_section::with(|cs| self.state.borrow(cs).get()) {
            BusState::Ready(config) => Some(config),
            _ => None,
        }
    }
}

/// Handle to an initialized bus. Every call locks the controller for the whole transaction.
pub struct CanBus<'a, B, CS, INT, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    INT: InputPin,
    CLK: Clock,
{
    owner: &'a Mcp2515<B, CS, INT, CLK>,
}

impl<B, CS, INT, CLK> Clone for CanBus<'_, B, CS, INT, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    INT: InputPin,
    CLK: Clock,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<B, CS, INT, CLK> Copy for CanBus<'_, B, CS, INT, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    INT: InputPin,
    CLK: Clock,
{
}

impl<B, CS, INT, CLK> CanBus<'_, B, CS, INT, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    INT: InputPin,
    CLK: Clock,
{
    /// Transmits the frame using the given transmit buffer (0-2)
    pub fn send(&self, frame: &CanFrame, buffer: u8) -> Result<(), Error<B::Error, CS::Error>> {
        let buffer = TxBuffer::try_from(buffer).map_err(Error::ArgumentRange)?;

        self.locked(|controller| controller.transmit(frame, buffer))
    }

    /// Transmits any [embedded_can::Frame], fails for frames exceeding 8 data bytes
    pub fn send_frame<F: Frame>(&self, frame: &F, buffer: u8) -> Result<(), Error<B::Error, CS::Error>> {
        let frame = CanFrame::from_frame(frame).map_err(|_| Error::UnsupportedFrameKind)?;

        self.send(&frame, buffer)
    }

    /// Returns true if the transmit buffer (0-2) still waits for transmission
    pub fn is_tx_pending(&self, buffer: u8) -> Result<bool, Error<B::Error, CS::Error>> {
        let buffer = TxBuffer::try_from(buffer).map_err(Error::ArgumentRange)?;

        Ok(self.locked(|controller| controller.is_tx_pending(buffer))?)
    }

    /// Aborts all pending transmissions, fails with [Error::AbortTimeout] if a buffer keeps its request
    pub fn abort_all(&self, clock: &CLK) -> Result<(), Error<B::Error, CS::Error>> {
        self.locked(|controller| controller.abort_all(clock))
    }

    /// Drains both receive buffers and returns the frames in buffer order.
    /// A buffer holding an invalid frame is reported once no valid frame is left, see [Controller::poll].
    pub fn poll(&self) -> Result<Vec<CanFrame>, Error<B::Error, CS::Error>> {
        self.locked(|controller| controller.poll())
    }

    /// Registers the callback invoked by [Self::handle_interrupt], replacing any previous one
    pub fn on_frame_received<F>(&self, handler: F)
    where
        F: FnMut(&CanFrame) + Send + 'static,
    {
        critical_section::with(|cs| {
            self.owner.handler.borrow_ref_mut(cs).replace(Box::new(handler));
        });
    }

    /// Drains the receive buffers and passes the frames to the registered callback.
    /// Intended to be called on the falling edge of the interrupt line. Returns the number of frames.
    ///
    /// The callback runs outside the lock and may use this handle. Valid frames are passed to the callback
    /// even if the other buffer holds an invalid frame, [Error::InvalidFrame] is returned afterwards.
    pub fn handle_interrupt(&self) -> Result<usize, Error<B::Error, CS::Error>> {
        let mut frames = Vec::with_capacity(RxBuffer::ALL.len());
        let result = self.locked(|controller| controller.receive_pending(|frame| frames.push(frame)));

        if !frames.is_empty() {
            self.dispatch(&frames);
        }

        result
    }

    /// Passes the frames to the registered callback
    fn dispatch(&self, frames: &[CanFrame]) {
        let handler = critical_section::with(|cs| self.owner.handler.borrow_ref_mut(cs).take());

        match handler {
            None => debug!("No frame handler registered, dropping {} frame(s)", frames.len()),
            Some(mut handler) => {
                frames.iter().for_each(|frame| handler(frame));

                // callback may have registered a new handler in the meantime
                critical_section::with(|cs| {
                    let mut slot = self.owner.handler.borrow_ref_mut(cs);
                    if slot.is_none() {
                        *slot = Some(handler);
                    }
                });
            }
        }
    }

    /// Drops the frame held by the receive buffer (0-1), e.g. after [Error::InvalidFrame]
    pub fn release_rx_buffer(&self, buffer: u8) -> Result<(), Error<B::Error, CS::Error>> {
        let buffer = RxBuffer::try_from(buffer).map_err(Error::ArgumentRange)?;

        Ok(self.locked(|controller| controller.release_rx_buffer(buffer))?)
    }

    /// Switches to the given mode at runtime
    pub fn set_mode(&self, mode: RequestMode, clock: &CLK) -> Result<(), ConfigError<B::Error, CS::Error>> {
        self.locked(|controller| controller.set_mode(mode.to_operation_mode(), clock))
    }

    /// Enables or disables acceptance filtering
    pub fn set_filter_enabled(&self, enabled: bool) -> Result<(), BusError<B::Error, CS::Error>> {
        self.locked(|controller| controller.set_filter_enabled(enabled))
    }

    /// Writes an acceptance filter
    pub fn set_filter(&self, filter: &Filter, clock: &CLK) -> Result<(), ConfigError<B::Error, CS::Error>> {
        self.locked(|controller| controller.set_filter(filter, clock))
    }

    /// Writes an acceptance mask
    pub fn set_mask(&self, mask: &Mask, clock: &CLK) -> Result<(), ConfigError<B::Error, CS::Error>> {
        self.locked(|controller| controller.set_mask(mask, clock))
    }

    pub fn read_operation_status(&self) -> Result<OperationStatus, BusError<B::Error, CS::Error>> {
        self.locked(|controller| controller.read_operation_status())
    }

    pub fn read_error_flags(&self) -> Result<ErrorFlags, BusError<B::Error, CS::Error>> {
        self.locked(|controller| controller.read_error_flags())
    }

    pub fn read_error_counters(&self) -> Result<ErrorCounters, BusError<B::Error, CS::Error>> {
        self.locked(|controller| controller.read_error_counters())
    }

    pub fn read_rx_status(&self) -> Result<RxStatus, BusError<B::Error, CS::Error>> {
        self.locked(|controller| controller.read_rx_status())
    }

    /// Level of the interrupt line, always false in polling mode
    pub fn is_interrupt_pending(&self) -> Result<bool, INT::Error> {
        self.locked(|controller| controller.is_interrupt_pending())
    }

    /// Runs the given operation with exclusive access to the controller
    fn locked<R, F>(&self, operation: F) -> R
    where
        F: FnOnce(&mut Controller<B, CS, INT, CLK>) -> R,
    {
        critical_section::with(|cs| operation(&mut self.owner.controller.borrow_ref_mut(cs)))
    }
}
