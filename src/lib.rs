#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
#![allow(clippy::identity_op)]

//! # Library for MCP2515 CAN controller
//!
//! Crate currently offer the following features:
//! * CAN 2.0 standard and extended frames, data and remote transmission requests
//! * Bit timing tables for 8, 16 and 20 MHz crystals
//! * Interrupt or polling driven reception
//! * Acceptance filters and masks
//! * no_std support
//!
//!## CAN Tx/Rx example
//!
//!```
//!use mcp2515::bus::Mcp2515;
//!use mcp2515::config::{Bitrate, Configuration, Oscillator, RequestMode};
//!use mcp2515::example::{ExampleCSPin, ExampleClock, ExampleSPIBus};
//!use mcp2515::frame::CanFrame;
//!use embedded_can::{ExtendedId, Frame, StandardId};
//!
//!let spi_bus = ExampleSPIBus::default();
//!let simulator = spi_bus.clone();
//!let clock = ExampleClock::default();
//!
//!let mcp2515 = Mcp2515::new(spi_bus, ExampleCSPin {}, Oscillator::MHz16);
//!
//! // Loopback mode delivers transmitted frames to the own receive buffers
//!let can = mcp2515
//!    .create_can_bus_with(
//!        &Configuration {
//!            mode: RequestMode::LoopBack,
//!            ..Configuration::with_bitrate(Bitrate::Kbps250)
//!        },
//!        &clock,
//!    )
//!    .unwrap();
//!
//! // Transmit CAN message
//!let frame = CanFrame::new(ExtendedId::new(0x14C92A2B).unwrap(), &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
//!can.send(&frame, 0).unwrap();
//!
//! // Frame of another node
//!let remote = CanFrame::new_remote(StandardId::new(0x55).unwrap(), 4).unwrap();
//!assert!(simulator.inject(&remote));
//!
//! // Receive CAN messages
//!let received = can.poll().unwrap();
//!assert_eq!(vec![frame, remote], received);
//!```

extern crate alloc;

pub mod buffer;
pub mod bus;
pub mod can;
pub mod config;
pub mod status;

pub mod filter;
pub mod frame;
pub mod message;

pub mod example;
#[cfg(test)]
pub(crate) mod mocks;
pub mod registers;
#[cfg(test)]
mod tests;
