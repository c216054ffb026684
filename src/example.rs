//! # Register level simulation of the MCP2515 for doc examples and tests
//!
//! [ExampleSPIBus] executes the SPI instruction set against an in-memory register file.
//! Mode requests take effect immediately, transmissions in loopback mode are delivered to the
//! receive buffers honoring filters, masks and rollover. Frames from other nodes can be
//! simulated by [ExampleSPIBus::inject].
use crate::frame::CanFrame;
use crate::message::{EncodedFrame, HEADER_LENGTH, RTR_MASK};
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_time::clock::Error;
use embedded_time::duration::{Duration, Fraction};
use embedded_time::fixed_point::FixedPoint;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};

const CANSTAT: usize = 0x0E;
const CANCTRL: usize = 0x0F;
const CANINTE: usize = 0x2B;
const CANINTF: usize = 0x2C;
const EFLG: usize = 0x2D;
const TXB_CTRL: [usize; 3] = [0x30, 0x40, 0x50];
const RXB_CTRL: [usize; 2] = [0x60, 0x70];
const FILTERS: [usize; 6] = [0x00, 0x04, 0x08, 0x10, 0x14, 0x18];
const MASKS: [usize; 2] = [0x20, 0x24];

/// Raw buffer image: SIDH, SIDL, EID8, EID0, DLC, D0..D7
type BufferImage = [u8; HEADER_LENGTH + 8];

/// Register memory of the simulated chip
#[derive(Debug)]
pub struct RegisterFile {
    memory: [u8; 0x80],
}

impl Default for RegisterFile {
    fn default() -> Self {
        let mut file = Self { memory: [0; 0x80] };
        file.reset();
        file
    }
}

impl RegisterFile {
    fn reset(&mut self) {
        self.memory = [0; 0x80];
        // configuration mode, CLKOUT enabled with divisor 8
        self.memory[CANSTAT] = 0x80;
        self.memory[CANCTRL] = 0x87;
    }

    fn execute(&mut self, words: &mut [u8]) {
        let address = words.get(1).copied().unwrap_or_default() as usize;

        match words[0] {
            0xC0 => self.reset(),
            0x03 => {
                for (i, word) in words.iter_mut().skip(2).enumerate() {
                    *word = self.memory[(address + i) & 0x7F];
                }
            }
            0x02 => {
                for (i, value) in words.iter().skip(2).enumerate() {
                    self.write((address + i) & 0x7F, *value);
                }
            }
            0x05 if words.len() >= 4 => {
                let previous = self.memory[address & 0x7F];
                self.write(address & 0x7F, (previous & !words[2]) | (words[3] & words[2]));
            }
            0xA0 => {
                let status = self.read_status();
                words.iter_mut().skip(1).for_each(|word| *word = status);
            }
            0xB0 => {
                let status = self.rx_status();
                words.iter_mut().skip(1).for_each(|word| *word = status);
            }
            instruction @ 0x90..=0x96 => {
                let buffer = ((instruction >> 2) & 1) as usize;
                let start = RXB_CTRL[buffer] + 1 + if instruction & 0x02 != 0 { HEADER_LENGTH } else { 0 };

                for (i, word) in words.iter_mut().skip(1).enumerate() {
                    *word = self.memory[(start + i) & 0x7F];
                }
                self.memory[CANINTF] &= !(1 << buffer);
            }
            instruction @ 0x40..=0x45 => {
                let buffer = ((instruction >> 1) & 0x3) as usize;
                let start = TXB_CTRL[buffer] + 1 + if instruction & 0x01 != 0 { HEADER_LENGTH } else { 0 };

                for (i, value) in words.iter().skip(1).enumerate() {
                    self.memory[(start + i) & 0x7F] = *value;
                }
            }
            _ => {}
        }
    }

    fn write(&mut self, address: usize, value: u8) {
        match address {
            CANSTAT => {}
            CANCTRL => {
                self.memory[CANCTRL] = value;
                self.memory[CANSTAT] = (self.memory[CANSTAT] & 0x1F) | (value & 0xE0);

                if value & 0x10 != 0 {
                    self.abort_all();
                }
            }
            _ => {
                self.memory[address] = value;

                if let Some(buffer) = TXB_CTRL.iter().position(|ctrl| *ctrl == address) {
                    if value & 0x08 != 0 {
                        self.transmit(buffer);
                    }
                }
            }
        }
    }

    fn abort_all(&mut self) {
        for ctrl in TXB_CTRL {
            if self.memory[ctrl] & 0x08 != 0 {
                // ABTF set, TXREQ cleared
                self.memory[ctrl] = (self.memory[ctrl] & !0x08) | 0x40;
            }
        }
    }

    fn transmit(&mut self, buffer: usize) {
        let start = TXB_CTRL[buffer] + 1;
        let mut image: BufferImage = [0; HEADER_LENGTH + 8];
        image.copy_from_slice(&self.memory[start..start + HEADER_LENGTH + 8]);

        self.memory[TXB_CTRL[buffer]] &= !0x08;
        self.memory[CANINTF] |= 1 << (2 + buffer);

        // loopback mode
        if self.memory[CANSTAT] >> 5 == 0b010 {
            self.deliver(image);
        }
    }

    /// Stores the image in the first accepting receive buffer, false if dropped
    fn deliver(&mut self, image: BufferImage) -> bool {
        let accepted_0 = self.accepts(0, &image, &FILTERS[..2], MASKS[0]);
        let rollover = self.memory[RXB_CTRL[0]] & 0x04 != 0;

        if let Some(hit) = accepted_0 {
            if self.memory[CANINTF] & 0x01 == 0 {
                self.store(0, image, hit);
                return true;
            }

            if rollover && self.memory[CANINTF] & 0x02 == 0 {
                self.store(1, image, hit);
                return true;
            }

            self.memory[EFLG] |= if rollover { 0x80 } else { 0x40 };
            return false;
        }

        if let Some(hit) = self.accepts(1, &image, &FILTERS[2..], MASKS[1]) {
            if self.memory[CANINTF] & 0x02 == 0 {
                self.store(1, image, hit + 2);
                return true;
            }

            self.memory[EFLG] |= 0x80;
        }

        false
    }

    /// Index of the matching filter within the given set, 0 if filters are turned off
    fn accepts(&self, buffer: usize, image: &BufferImage, filters: &[usize], mask: usize) -> Option<u8> {
        if self.memory[RXB_CTRL[buffer]] & 0x60 == 0x60 {
            return Some(0);
        }

        let extended = image[1] & 0x08 != 0;
        let identifier = identifier_bits(&image[..4]);
        let mut relevant = identifier_bits(&self.memory[mask..mask + 4]);
        if !extended {
            relevant &= !0x3FFFF;
        }

        filters
            .iter()
            .position(|filter| {
                let filter_extended = self.memory[filter + 1] & 0x08 != 0;
                let pattern = identifier_bits(&self.memory[*filter..*filter + 4]);

                filter_extended == extended && (identifier ^ pattern) & relevant == 0
            })
            .map(|index| index as u8)
    }

    fn store(&mut self, buffer: usize, mut image: BufferImage, filter_hit: u8) {
        let remote = image[4] & RTR_MASK != 0;
        let extended = image[1] & 0x08 != 0;

        // SRR flags standard remote frames in receive buffers
        if remote && !extended {
            image[1] |= 0x10;
        }

        let ctrl = RXB_CTRL[buffer];
        self.memory[ctrl + 1..ctrl + 1 + image.len()].copy_from_slice(&image);

        let hit_mask = if buffer == 0 { 0x01 } else { 0x07 };
        let mut control = self.memory[ctrl] & !(0x08 | hit_mask);
        if remote {
            control |= 0x08;
        }
        self.memory[ctrl] = control | (filter_hit & hit_mask);
        self.memory[CANINTF] |= 1 << buffer;
    }

    fn read_status(&self) -> u8 {
        let flags = self.memory[CANINTF];
        let mut status = flags & 0x03;

        for (i, ctrl) in TXB_CTRL.iter().enumerate() {
            if self.memory[*ctrl] & 0x08 != 0 {
                status |= 1 << (2 + 2 * i);
            }
            if flags & (1 << (2 + i)) != 0 {
                status |= 1 << (3 + 2 * i);
            }
        }

        status
    }

    fn rx_status(&self) -> u8 {
        let flags = self.memory[CANINTF] & 0x03;
        let buffer = match flags {
            0 => return 0,
            0x02 => 1,
            _ => 0,
        };

        let ctrl = RXB_CTRL[buffer];
        let mut status = flags << 6;
        if self.memory[ctrl + 2] & 0x08 != 0 {
            status |= 0x10;
        }
        if self.memory[ctrl] & 0x08 != 0 {
            status |= 0x08;
        }

        status | (self.memory[ctrl] & if buffer == 0 { 0x01 } else { 0x07 })
    }
}

/// SID and EID bits of SIDH, SIDL, EID8, EID0 as 29 bit value
fn identifier_bits(registers: &[u8]) -> u32 {
    ((registers[0] as u32) << 21)
        | (((registers[1] >> 5) as u32) << 18)
        | (((registers[1] & 0x03) as u32) << 16)
        | ((registers[2] as u32) << 8)
        | registers[3] as u32
}

/// Simulated MCP2515 on a SPI bus. Clones share the same chip.
#[derive(Default, Debug, Clone)]
pub struct ExampleSPIBus {
    registers: Rc<RefCell<RegisterFile>>,
}

impl ExampleSPIBus {
    /// Simulates a frame received from another node, returns false if the frame was not accepted
    pub fn inject(&self, frame: &CanFrame) -> bool {
        let encoded = EncodedFrame::encode(frame);
        let mut image: BufferImage = [0; HEADER_LENGTH + 8];
        image[..encoded.as_bytes().len()].copy_from_slice(encoded.as_bytes());

        self.registers.borrow_mut().deliver(image)
    }

    /// Raw register value
    pub fn register(&self, address: u8) -> u8 {
        self.registers.borrow().memory[address as usize & 0x7F]
    }

    /// Overwrites a register without side effects
    pub fn set_register(&self, address: u8, value: u8) {
        self.registers.borrow_mut().memory[address as usize & 0x7F] = value;
    }

    /// Interrupt line of the simulated chip
    pub fn interrupt_pin(&self) -> ExampleInterruptPin {
        ExampleInterruptPin {
            registers: self.registers.clone(),
        }
    }
}

impl Transfer<u8> for ExampleSPIBus {
    type Error = Infallible;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        if !words.is_empty() {
            self.registers.borrow_mut().execute(words);
        }

        Ok(words)
    }
}

#[derive(Default, Debug, Copy, Clone)]
pub struct ExampleCSPin {}

impl OutputPin for ExampleCSPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Active-low interrupt line, low while an enabled interrupt flag is set
#[derive(Debug, Clone)]
pub struct ExampleInterruptPin {
    registers: Rc<RefCell<RegisterFile>>,
}

impl InputPin for ExampleInterruptPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        let registers = self.registers.borrow();
        Ok(registers.memory[CANINTF] & registers.memory[CANINTE] != 0)
    }
}

/// Clock advancing by a fixed step on every read
#[derive(Debug, PartialEq, Eq)]
pub struct ExampleClock {
    now: Cell<u64>,
    step: u64,
}

impl ExampleClock {
    /// Clock advancing `step` microseconds per read
    pub fn new(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }
}

impl Default for ExampleClock {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl Clock for ExampleClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        let now = self.now.get() + self.step;
        self.now.set(now);

        Ok(Instant::new(now))
    }

    fn new_timer<Dur: Duration + FixedPoint>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur> {
        Timer::new(self, duration)
    }
}
