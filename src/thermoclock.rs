//! Clock with a temperature log
//!
//! Once a second the clock samples the internal temperature sensor, stores the reading in a ten
//! slot moving average and shows the average in Celsius and Fahrenheit above the date and time.
//!
//! The right button enters edit mode. The clock stops, the date resets to January 1st 00:00:00 and
//! each field is set in turn: the left button increments the underlined field, the right button
//! confirms it and moves to the next one. Confirming the seconds commits the new time to the
//! counter in a single store and restarts the average.
//!
//! ```text
//! Run -(right)-> Edit(Month) -> Edit(Day) -> Edit(Hour) -> Edit(Minute) -> Edit(Second)
//!  ^                                                                             |
//!  +------------------------------------ Commit <--------------------------------+
//! ```

use crate::adc::{Sampler, TempCalibration};
use crate::average::MovingAverage;
use crate::calendar::{
    days_in_month, Calendar, DAY_SECONDS, HOUR_SECONDS, MINUTE_SECONDS,
};
use crate::display::{Display, CENTER_X};
use crate::gpio::Button;
use crate::text;
use crate::timer::{has_elapsed, Monotonic, TickCounter};
use embedded_hal::digital::InputPin;

/// Number of samples in the temperature average
pub const AVERAGE_LEN: usize = 10;

const CELSIUS_ROW: i32 = 50;
const FAHRENHEIT_ROW: i32 = 60;
const DATE_ROW: i32 = 80;
const TIME_ROW: i32 = 90;

/// Settings of the clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThermoClockConfig {
    /// Temperature sensor calibration
    pub calibration: TempCalibration,
    /// Spins allowed for one ADC conversion
    pub adc_budget: u32,
    /// Time the counter is set to at startup, in seconds since January 1st
    pub start_seconds: u32,
}

impl ThermoClockConfig {
    /// Configuration for a sensor with the given calibration
    pub fn new(calibration: TempCalibration) -> Self {
        ThermoClockConfig {
            calibration,
            adc_budget: 10_000,
            start_seconds: 0,
        }
    }

    /// Set the ADC spin budget
    #[inline]
    pub fn adc_budget(mut self, budget: u32) -> Self {
        self.adc_budget = budget;
        self
    }

    /// Set the startup time
    #[inline]
    pub fn start_seconds(mut self, seconds: u32) -> Self {
        self.start_seconds = seconds;
        self
    }
}

/// Field being edited
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EditField {
    /// Month of the year
    Month,
    /// Day of the month
    Day,
    /// Hour of the day
    Hour,
    /// Minute of the hour
    Minute,
    /// Second of the minute
    Second,
}

impl EditField {
    /// Field edited after this one, `None` after the seconds
    pub fn next(self) -> Option<EditField> {
        match self {
            EditField::Month => Some(EditField::Day),
            EditField::Day => Some(EditField::Hour),
            EditField::Hour => Some(EditField::Minute),
            EditField::Minute => Some(EditField::Second),
            EditField::Second => None,
        }
    }

    /// Underline under the field on screen, as `(x1, x2, y)`
    pub fn underline(self) -> (i32, i32, i32) {
        match self {
            EditField::Month => (44, 64, 85),
            EditField::Day => (64, 84, 85),
            EditField::Hour => (40, 50, 95),
            EditField::Minute => (58, 68, 95),
            EditField::Second => (76, 86, 95),
        }
    }
}

/// Time being entered in edit mode.
///
/// Each confirmed field adds its share of seconds to the total, so the new time is only known in
/// full once the seconds are confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EditSession {
    value: Calendar,
    field: EditField,
    total: u32,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    /// Start at January 1st 00:00:00 with the month selected
    pub fn new() -> Self {
        EditSession {
            value: Calendar::default(),
            field: EditField::Month,
            total: 0,
        }
    }

    /// Fields as entered so far
    #[inline]
    pub fn value(&self) -> &Calendar {
        &self.value
    }

    /// Field currently selected
    #[inline]
    pub fn field(&self) -> EditField {
        self.field
    }

    /// Increment the selected field, wrapping back to its first value
    pub fn increment(&mut self) {
        let v = &mut self.value;
        match self.field {
            EditField::Month => v.month = if v.month < 12 { v.month + 1 } else { 1 },
            EditField::Day => {
                v.day = if v.day < days_in_month(v.month) {
                    v.day + 1
                } else {
                    1
                }
            }
            EditField::Hour => v.hour = if v.hour < 23 { v.hour + 1 } else { 0 },
            EditField::Minute => v.minute = if v.minute < 59 { v.minute + 1 } else { 0 },
            EditField::Second => v.second = if v.second < 59 { v.second + 1 } else { 0 },
        }
    }

    /// Confirm the selected field and select the next one. Returns the complete time in seconds
    /// once the seconds are confirmed.
    pub fn confirm(&mut self) -> Option<u32> {
        let v = &self.value;
        self.total += match self.field {
            EditField::Month => {
                let days_before: u32 = (1..v.month).map(|m| days_in_month(m) as u32).sum();
                days_before * DAY_SECONDS
            }
            EditField::Day => (v.day as u32 - 1) * DAY_SECONDS,
            EditField::Hour => v.hour as u32 * HOUR_SECONDS,
            EditField::Minute => v.minute as u32 * MINUTE_SECONDS,
            EditField::Second => v.second as u32,
        };
        match self.field.next() {
            Some(next) => {
                self.field = next;
                None
            }
            None => Some(self.total),
        }
    }
}

/// States of the clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockState {
    /// Counting, sampling and displaying
    Run,
    /// Setting the given field
    Edit(EditField),
    /// Store the edited time and restart counting
    Commit,
}

/// The clock bound to its peripherals and seconds counter
pub struct ThermoClock<'a, D, R: InputPin, L: InputPin, S> {
    display: D,
    right: Button<R>,
    left: Button<L>,
    sensor: S,
    counter: &'a TickCounter,
    config: ThermoClockConfig,
    state: ClockState,
    session: EditSession,
    average: MovingAverage<AVERAGE_LEN>,
    prev: u32,
}

impl<'a, D, R, L, S> ThermoClock<'a, D, R, L, S>
where
    D: Display,
    R: InputPin,
    L: InputPin,
    S: Sampler,
{
    /// Bind the clock. The counter is set to the configured start time and the first step
    /// displays immediately.
    pub fn new(
        display: D,
        right: R,
        left: L,
        sensor: S,
        counter: &'a TickCounter,
        config: ThermoClockConfig,
    ) -> Self {
        counter.set(config.start_seconds);
        counter.resume();
        let mut display = display;
        display.clear_and_flush();
        ThermoClock {
            display,
            right: Button::new(right),
            left: Button::new(left),
            sensor,
            counter,
            config,
            state: ClockState::Run,
            session: EditSession::new(),
            average: MovingAverage::new(),
            prev: config.start_seconds.wrapping_sub(1),
        }
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Time being edited
    #[inline]
    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Average temperature in tenths of a degree Celsius, `None` before the first sample
    pub fn average_celsius(&self) -> Option<i32> {
        self.average.average()
    }

    /// Borrow the display
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Mutably borrow the sensor
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Run one iteration and return the next state
    pub fn step(&mut self) -> ClockState {
        // Both buttons are read every step so their edges stay current in every state
        let right = self.right.was_pressed();
        let left = self.left.was_pressed();
        let next = match self.state {
            ClockState::Run => self.run_once(right),
            ClockState::Edit(field) => {
                if right {
                    match self.session.confirm() {
                        Some(_) => ClockState::Commit,
                        None => {
                            self.draw_edit();
                            ClockState::Edit(self.session.field())
                        }
                    }
                } else if left {
                    self.session.increment();
                    self.draw_edit();
                    ClockState::Edit(field)
                } else {
                    ClockState::Edit(field)
                }
            }
            ClockState::Commit => {
                let seconds = self.session.total;
                self.counter.set(seconds);
                self.prev = seconds.wrapping_sub(1);
                self.average.reset();
                self.counter.resume();
                info!("clock: time set to {}", seconds);
                ClockState::Run
            }
        };
        if next != self.state {
            debug!("clock: {} -> {}", self.state, next);
        }
        self.state = next;
        next
    }

    /// Run the clock forever
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    fn run_once(&mut self, right: bool) -> ClockState {
        let now = self.counter.now();
        if has_elapsed(now, self.prev) {
            self.sample(now);
            self.draw_run(now);
            self.prev = now;
        }

        if right {
            self.counter.pause();
            self.session = EditSession::new();
            self.draw_edit();
            return ClockState::Edit(EditField::Month);
        }
        ClockState::Run
    }

    fn sample(&mut self, now: u32) {
        match self.sensor.read(self.config.adc_budget) {
            Ok(code) => {
                let celsius = self.config.calibration.celsius_tenths(code);
                self.average.push(now, celsius);
            }
            Err(_) => {
                warn!("clock: temperature sample at {} timed out", now);
                self.average.skip(now);
            }
        }
    }

    fn draw_run(&mut self, now: u32) {
        self.display.clear();
        if let Some(celsius) = self.average.average() {
            let fahrenheit = TempCalibration::to_fahrenheit(celsius);
            self.display
                .draw_centered(&text::tenths(celsius, 'C'), CENTER_X, CELSIUS_ROW);
            self.display
                .draw_centered(&text::tenths(fahrenheit, 'F'), CENTER_X, FAHRENHEIT_ROW);
        }
        self.draw_time(&Calendar::from_seconds(now));
        self.display.flush();
    }

    fn draw_edit(&mut self) {
        let value = *self.session.value();
        let (x1, x2, y) = self.session.field().underline();
        self.display.clear();
        self.draw_time(&value);
        self.display.draw_hline(x1, x2, y);
        self.display.flush();
    }

    fn draw_time(&mut self, cal: &Calendar) {
        self.display
            .draw_centered(&text::date(cal.month, cal.day), CENTER_X, DATE_ROW);
        self.display.draw_centered(
            &text::clock(cal.hour, cal.minute, cal.second),
            CENTER_X,
            TIME_ROW,
        );
    }
}
