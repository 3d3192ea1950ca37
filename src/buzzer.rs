//! Piezo buzzer
//!
//! The buzzer is driven by a timer in PWM mode clocked from the 32768 Hz ACLK. A "pitch" is the
//! PWM period in ACLK ticks, so larger values give lower notes. The buzzer sounds at a 50 % duty
//! cycle whatever the period.

use embedded_hal::pwm::SetDutyCycle;

/// Frequency of the clock the buzzer timer counts
pub const ACLK_HZ: u32 = 32_768;

/// Convert a note frequency to a PWM period in ACLK ticks. Returns 0 (silence) for 0 Hz or for
/// frequencies above the clock.
pub fn period_for(freq_hz: u16) -> u16 {
    match freq_hz {
        0 => 0,
        f => (ACLK_HZ / f as u32).min(u16::MAX as u32) as u16,
    }
}

/// Tone generator
pub trait Buzzer {
    /// Sound a square wave with the given period in ACLK ticks. A period of 0 silences the buzzer.
    fn start(&mut self, period: u16);

    /// Silence the buzzer
    fn stop(&mut self);

    /// Sound a note given in Hz. 0 Hz is a rest and silences the buzzer.
    fn tone(&mut self, freq_hz: u16) {
        self.start(period_for(freq_hz));
    }
}

impl<T: Buzzer + ?Sized> Buzzer for &mut T {
    fn start(&mut self, period: u16) {
        (**self).start(period)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Timer whose period (CCR0) can be rewritten while running
pub trait PeriodControl {
    /// Set the number of timer ticks per PWM period
    fn set_period(&mut self, ticks: u16);
}

/// [`Buzzer`] over a PWM output channel and the timer that clocks it
pub struct PwmBuzzer<P: SetDutyCycle, T: PeriodControl> {
    channel: P,
    timer: T,
}

impl<P: SetDutyCycle, T: PeriodControl> PwmBuzzer<P, T> {
    /// Take the PWM channel and its timer. The buzzer starts silent.
    pub fn new(channel: P, timer: T) -> Self {
        let mut buzzer = PwmBuzzer { channel, timer };
        buzzer.stop();
        buzzer
    }

    /// Release the channel and timer
    pub fn free(self) -> (P, T) {
        (self.channel, self.timer)
    }
}

impl<P: SetDutyCycle, T: PeriodControl> Buzzer for PwmBuzzer<P, T> {
    fn start(&mut self, period: u16) {
        if period == 0 {
            self.stop();
            return;
        }
        self.timer.set_period(period);
        // The channel's max duty tracks the timer period, so half of it is a 50 % duty cycle
        self.channel.set_duty_cycle_percent(50).ok();
    }

    fn stop(&mut self) {
        self.channel.set_duty_cycle_fully_off().ok();
    }
}
