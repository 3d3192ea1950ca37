//! Analog to Digital Converter (ADC)
//!
//! Conversions are non-blocking: [`Sampler::sample`] starts a conversion on the first call and
//! returns `WouldBlock` until the result is ready. [`Sampler::read`] wraps that in a bounded spin so
//! a stuck converter cannot hang the main loop.
//!
//! The raw code is turned into a physical value by [`TempCalibration`] (internal temperature
//! sensor) or [`Voltmeter`] (external voltage on an analog pin).

use crate::timer::{poll, PollErr};

/// Source of single ADC samples
pub trait Sampler {
    /// Error the converter can report besides "still busy"
    type Error;

    /// Begins a single conversion if one is not already underway.
    ///
    /// If the result is ready it is returned, otherwise returns `WouldBlock`.
    fn sample(&mut self) -> nb::Result<u16, Self::Error>;

    /// Sample, spinning at most `budget` times while the conversion is busy
    fn read(&mut self, budget: u32) -> Result<u16, PollErr<Self::Error>> {
        poll(budget, || self.sample())
    }
}

impl<T: Sampler + ?Sized> Sampler for &mut T {
    type Error = T::Error;

    fn sample(&mut self) -> nb::Result<u16, Self::Error> {
        (**self).sample()
    }
}

/// Factory calibration of the internal temperature sensor.
///
/// The two codes are what the sensor read at 30 C and 85 C with the 1.5 V reference. They are
/// stored in the device descriptor (TLV) area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TempCalibration {
    /// Code at 30 C
    pub cal30: u16,
    /// Code at 85 C
    pub cal85: u16,
}

impl TempCalibration {
    /// Calibration from the two reference codes
    pub const fn new(cal30: u16, cal85: u16) -> Self {
        TempCalibration { cal30, cal85 }
    }

    /// Temperature in tenths of a degree Celsius, linearly interpolated between the two
    /// calibration points. A degenerate calibration reads as 30 C.
    pub fn celsius_tenths(&self, code: u16) -> i32 {
        let span = self.cal85 as i32 - self.cal30 as i32;
        let offset = code as i32 - self.cal30 as i32;
        (offset * 550).checked_div(span).unwrap_or(0) + 300
    }

    /// Convert tenths of a degree Celsius to tenths of a degree Fahrenheit
    #[inline]
    pub fn to_fahrenheit(celsius_tenths: i32) -> i32 {
        celsius_tenths * 9 / 5 + 320
    }
}

/// Scaling of ADC codes to a voltage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Voltmeter {
    /// Positive reference in millivolts
    pub ref_mv: u32,
    /// Code read at the reference voltage
    pub full_scale: u16,
}

impl Default for Voltmeter {
    /// 3.3 V reference, 12-bit conversion
    fn default() -> Self {
        Voltmeter {
            ref_mv: 3300,
            full_scale: 4095,
        }
    }
}

impl Voltmeter {
    /// Voltage in tenths of a volt, truncated
    pub fn tenths(&self, code: u16) -> u16 {
        (code as u32 * self.ref_mv)
            .checked_div(self.full_scale as u32 * 100)
            .unwrap_or(0) as u16
    }
}
