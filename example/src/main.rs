#![no_std]
#![no_main]

pub mod clock;
pub mod heap;

use crate::clock::SystemClock;
use crate::heap::Heap;
use embedded_can::{Frame, Id, StandardId};
use hal::clocks::Clock;
use hal::fugit::RateExtU32;
use hal::pac;
use log::warn;
use mcp2515::bus::Mcp2515;
use mcp2515::can::Error;
use mcp2515::config::{Bitrate, Oscillator};
use mcp2515::frame::CanFrame;
use panic_halt as _;
use rp2040_hal as hal;

#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

const XTAL_FREQ_HZ: u32 = 12_000_000u32;

static CLOCK: SystemClock = SystemClock::new();

#[rp2040_hal::entry]
fn main() -> ! {
    Heap::init();

    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // Configure the clocks
    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .unwrap();

    CLOCK.initialize(hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks));

    let sio = hal::Sio::new(pac.SIO);

    let pins = hal::gpio::Pins::new(pac.IO_BANK0, pac.PADS_BANK0, sio.gpio_bank0, &mut pac.RESETS);

    let spi_mosi = pins.gpio7.into_function::<hal::gpio::FunctionSpi>();
    let spi_miso = pins.gpio4.into_function::<hal::gpio::FunctionSpi>();
    let spi_sclk = pins.gpio6.into_function::<hal::gpio::FunctionSpi>();
    let spi = hal::spi::Spi::<_, _, _, 8>::new(pac.SPI0, (spi_mosi, spi_miso, spi_sclk));

    // MCP2515 supports max. 10 MHz SPI clock
    let spi = spi.init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        10.MHz(),
        embedded_hal::spi::MODE_0,
    );

    // Configure GPIO5 as an CS pin
    let pin_cs = pins.gpio5.into_push_pull_output();

    let mcp2515 = Mcp2515::new(spi, pin_cs, Oscillator::MHz8);
    let can = mcp2515.create_can_bus(Bitrate::Kbps500, &CLOCK).unwrap();

    // Echo every frame with the identifier incremented by one
    loop {
        let frames = match can.poll() {
            Ok(frames) => frames,
            Err(Error::InvalidFrame(dlc)) => {
                // only buffers with invalid frames are left, drop them
                warn!("Dropping received frame with DLC {dlc}");
                for buffer in 0..2 {
                    if let Err(error) = can.release_rx_buffer(buffer) {
                        warn!("Releasing RX buffer {buffer} failed: {error:?}");
                    }
                }
                continue;
            }
            Err(error) => {
                warn!("Receiving failed: {error:?}");
                continue;
            }
        };

        for frame in frames {
            let id = match frame.id() {
                Id::Standard(id) => StandardId::new(id.as_raw().wrapping_add(1) & 0x7FF).unwrap_or(StandardId::ZERO),
                Id::Extended(_) => continue,
            };

            if let Some(reply) = CanFrame::new(id, frame.data()) {
                if let Err(error) = can.send(&reply, 0) {
                    warn!("Echo of {:?} failed: {error:?}", reply.id());
                }
            }
        }
    }
}
