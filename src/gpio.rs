//! LEDs and push buttons
//!
//! The labs address LEDs as a bit mask, mirroring how the board's two indicators are usually set
//! together ("LED1 on, LED2 off"). Push buttons are active low with pull-ups.

use bitflags::bitflags;
use embedded_hal::digital::{InputPin, OutputPin};

bitflags! {
    /// Set of lit indicator LEDs
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LedMask: u8 {
        /// First indicator (red on the course board)
        const LED1 = 0b01;
        /// Second indicator (green on the course board)
        const LED2 = 0b10;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LedMask {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "LedMask({=u8:#b})", self.bits())
    }
}

/// A bank of indicator LEDs
pub trait Indicators {
    /// Light exactly the LEDs in `mask`, turning the others off
    fn show(&mut self, mask: LedMask);

    /// Turn every LED off
    fn all_off(&mut self) {
        self.show(LedMask::empty());
    }
}

impl<T: Indicators + ?Sized> Indicators for &mut T {
    fn show(&mut self, mask: LedMask) {
        (**self).show(mask)
    }
}

/// Two active-high LEDs
pub struct Leds<A: OutputPin, B: OutputPin> {
    led1: A,
    led2: B,
    lit: LedMask,
}

impl<A: OutputPin, B: OutputPin> Leds<A, B> {
    /// Take both LED pins and switch them off
    pub fn new(led1: A, led2: B) -> Self {
        let mut leds = Leds {
            led1,
            led2,
            lit: LedMask::all(),
        };
        leds.all_off();
        leds
    }

    /// LEDs currently lit
    pub fn lit(&self) -> LedMask {
        self.lit
    }

    /// Release the pins
    pub fn free(self) -> (A, B) {
        (self.led1, self.led2)
    }
}

impl<A: OutputPin, B: OutputPin> Indicators for Leds<A, B> {
    fn show(&mut self, mask: LedMask) {
        if mask.contains(LedMask::LED1) {
            self.led1.set_high().ok();
        } else {
            self.led1.set_low().ok();
        }
        if mask.contains(LedMask::LED2) {
            self.led2.set_high().ok();
        } else {
            self.led2.set_low().ok();
        }
        self.lit = mask;
    }
}

/// Active-low push button with edge detection
pub struct Button<P: InputPin> {
    pin: P,
    was_down: bool,
}

impl<P: InputPin> Button<P> {
    /// Wrap a pulled-up input pin. A button held at startup does not count as a press.
    pub fn new(mut pin: P) -> Self {
        let was_down = pin.is_low().unwrap_or(false);
        Button { pin, was_down }
    }

    /// Whether the button is held right now
    pub fn is_pressed(&mut self) -> bool {
        self.pin.is_low().unwrap_or(false)
    }

    /// Whether the button went down since the previous call. Holding the button reports a single
    /// press.
    pub fn was_pressed(&mut self) -> bool {
        let down = self.is_pressed();
        let pressed = down && !self.was_down;
        self.was_down = down;
        pressed
    }

    /// Release the pin
    pub fn free(self) -> P {
        self.pin
    }
}
