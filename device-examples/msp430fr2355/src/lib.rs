//! Board glue shared by the lab binaries
//!
//! Pin assignment on the MSP430FR2355 LaunchPad:
//!
//! | Function            | Pins                                       |
//! |---------------------|--------------------------------------------|
//! | Display (UART, 9600)| P4.3 TX (eUSCI_A1, backchannel UART)       |
//! | Keypad columns      | P3.0, P3.1, P3.2                           |
//! | Keypad rows         | P3.3, P3.4, P3.5, P3.6 (pulled up)         |
//! | Buttons             | S1 = P4.1 (left), S2 = P2.3 (right)        |
//! | LEDs                | LED1 = P1.0, LED2 = P6.6                   |
//! | Buzzer              | P6.3 (TB3.4 PWM)                           |
//! | Voltmeter input     | P1.1 (A1)                                  |
//! | SPI master          | P4.5 SCLK, P4.6 SIMO, P4.7 SOMI (eUSCI_B1) |
//! | SPI chip select     | P4.4                                       |
//! | SPI slave           | P1.4 STE, P1.5 CLK, P1.6 SOMI, P1.7 SIMO   |
//!
//! For the bridge lab wire P4.4 to P1.4, P4.5 to P1.5, P4.6 to P1.7 and P4.7 to P1.6.

#![no_std]

use core::marker::PhantomData;
use msp430_labs::adc::{Sampler, TempCalibration};
use msp430_labs::buzzer::PeriodControl;
use msp430_labs::timer::{LeapConfig, LeapCounter, TickCounter};
use msp430fr2355::TB3;

/// Seconds counter advanced by the RTC interrupt (clock and bridge labs)
pub static SECONDS: TickCounter = TickCounter::new();

/// 5 ms counter advanced by the RTC interrupt (music lab)
pub static MILLIS: LeapCounter = LeapCounter::new(LeapConfig {
    resolution_ms: 5,
    leap_period: 1024,
});

/// RTC modulo giving one interrupt per 5 ms with a 32768 Hz SMCLK
pub const MILLIS_RTC_MOD: u16 = 164;

// Device descriptor (TLV) entries of the 1.5 V reference temperature calibration
const TLV_ADC_1V5_30C: usize = 0x1A1A;
const TLV_ADC_1V5_85C: usize = 0x1A1C;

/// ADC reference the HAL converts millivolt readings against
pub const AVCC_MV: u16 = 3300;

/// Factory calibration of the internal temperature sensor
pub fn temp_calibration() -> TempCalibration {
    // SAFETY: the TLV area is read-only FRAM present on every device
    let (cal30, cal85) = unsafe {
        (
            core::ptr::read_volatile(TLV_ADC_1V5_30C as *const u16),
            core::ptr::read_volatile(TLV_ADC_1V5_85C as *const u16),
        )
    };
    TempCalibration::new(cal30, cal85)
}

/// Convert a sensor voltage into the 12-bit code it would give against the 1.5 V reference the
/// calibration was taken with
pub fn code_at_1v5(mv: u16) -> u16 {
    (mv as u32 * 4095 / 1500).min(4095) as u16
}

/// Fold a few noisy ADC readings into a seed
pub fn seed_from<S: Sampler>(sampler: &mut S, budget: u32) -> u64 {
    (0..16).fold(0x2545_f491_4f6c_dd1d, |seed: u64, _| {
        let bits = sampler.read(budget).unwrap_or(0) as u64;
        seed.rotate_left(5) ^ bits
    })
}

/// [`Sampler`] calling a closure, used to wrap the HAL's ADC channel reads
pub struct FnSampler<F, E> {
    read: F,
    _err: PhantomData<E>,
}

impl<F, E> FnSampler<F, E>
where
    F: FnMut() -> nb::Result<u16, E>,
{
    /// Sample by calling `read`
    pub fn new(read: F) -> Self {
        FnSampler {
            read,
            _err: PhantomData,
        }
    }
}

impl<F, E> Sampler for FnSampler<F, E>
where
    F: FnMut() -> nb::Result<u16, E>,
{
    type Error = E;

    fn sample(&mut self) -> nb::Result<u16, E> {
        (self.read)()
    }
}

/// Period register (CCR0) of TB3, which clocks the buzzer PWM
pub struct Tb3Period {
    _private: (),
}

impl Tb3Period {
    /// Take control of the TB3 period. Call once, after the PWM parts have been created.
    pub fn new() -> Self {
        Tb3Period { _private: () }
    }
}

impl Default for Tb3Period {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodControl for Tb3Period {
    fn set_period(&mut self, ticks: u16) {
        // SAFETY: the HAL's PWM parts only write CCR0 during setup
        let tb3 = unsafe { &*TB3::ptr() };
        // Up mode counts from 0 to CCR0 inclusive
        tb3.tb3ccr0
            .write(|w| unsafe { w.bits(ticks.saturating_sub(1)) });
    }
}
