use core::cell::RefCell;
use critical_section::Mutex;
use embedded_time::clock::Error;
use embedded_time::duration::{Duration, Fraction};
use embedded_time::fixed_point::FixedPoint;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};
use rp2040_hal::Timer as PicoTimer;

/// Microsecond clock backed by the RP2040 timer peripheral
pub struct SystemClock {
    inner: Mutex<RefCell<Option<PicoTimer>>>,
}

impl SystemClock {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn initialize(&self, timer: PicoTimer) {
        critical_section::with(|cs| self.inner.replace(cs, Some(timer)));
    }
}

impl Clock for SystemClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    /// Fails until [SystemClock::initialize] was called
    fn try_now(&self) -> Result<Instant<Self>, Error> {
        critical_section::with(|cs| match self.inner.borrow_ref(cs).as_ref() {
            None => Err(Error::NotRunning),
            Some(timer) => Ok(Instant::new(timer.get_counter().ticks())),
        })
    }

    fn new_timer<Dur: Duration>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur>
    where
        Dur: FixedPoint,
    {
        Timer::new(self, duration)
    }
}
