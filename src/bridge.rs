//! Time and voltage bridge
//!
//! Every second the board samples a voltage, pushes the seconds counter and the voltage through
//! the byte link and displays what came back. Values travel least significant byte first. There
//! is no acknowledgement or checksum; a byte that misses its deadline aborts the update for that
//! second and the previous screen stays up.

use crate::adc::{Sampler, Voltmeter};
use crate::calendar::Calendar;
use crate::display::{Display, CENTER_X};
use crate::link::{ByteLink, LinkErr};
use crate::text;
use crate::timer::{has_elapsed, Monotonic, TickCounter};

const TIME_ROW: i32 = 70;
const VOLTS_ROW: i32 = 80;

/// Settings of the bridge
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Value the seconds counter starts from
    pub start_seconds: u32,
    /// Spins allowed for one ADC conversion
    pub adc_budget: u32,
    /// Scaling of the sampled voltage
    pub voltmeter: Voltmeter,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            start_seconds: 2,
            adc_budget: 10_000,
            voltmeter: Voltmeter::default(),
        }
    }
}

impl BridgeConfig {
    /// Set the starting time
    #[inline]
    pub fn start_seconds(mut self, seconds: u32) -> Self {
        self.start_seconds = seconds;
        self
    }

    /// Set the ADC spin budget
    #[inline]
    pub fn adc_budget(mut self, budget: u32) -> Self {
        self.adc_budget = budget;
        self
    }
}

/// Values echoed back over the link during one update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transfer {
    /// Seconds counter
    pub seconds: u32,
    /// Voltage in tenths of a volt
    pub volts_tenths: u16,
}

/// Why an update was skipped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateErr {
    /// The voltage conversion never completed
    Sample,
    /// The exchange failed
    Link(LinkErr),
}

impl From<LinkErr> for UpdateErr {
    fn from(err: LinkErr) -> Self {
        UpdateErr::Link(err)
    }
}

/// The bridge bound to its peripherals and seconds counter
pub struct Bridge<'a, D, S, L> {
    display: D,
    sensor: S,
    link: L,
    counter: &'a TickCounter,
    config: BridgeConfig,
    prev: u32,
    last: Option<Transfer>,
    skipped: u32,
}

impl<'a, D: Display, S: Sampler, L: ByteLink> Bridge<'a, D, S, L> {
    /// Bind the bridge and start the counter from the configured time
    pub fn new(
        mut display: D,
        sensor: S,
        link: L,
        counter: &'a TickCounter,
        config: BridgeConfig,
    ) -> Self {
        counter.set(config.start_seconds);
        counter.resume();
        display.clear_and_flush();
        Bridge {
            display,
            sensor,
            link,
            counter,
            config,
            prev: config.start_seconds.wrapping_sub(1),
            last: None,
            skipped: 0,
        }
    }

    /// Values shown on screen, `None` before the first successful update
    #[inline]
    pub fn last(&self) -> Option<Transfer> {
        self.last
    }

    /// Number of updates skipped because of an error
    #[inline]
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    /// Borrow the display
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Mutably borrow the link
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Mutably borrow the sensor
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Release the peripherals
    pub fn free(self) -> (D, S, L) {
        (self.display, self.sensor, self.link)
    }

    /// Update once if a second has elapsed. Returns the displayed values when an update happened.
    pub fn step(&mut self) -> Option<Transfer> {
        let now = self.counter.now();
        if !has_elapsed(now, self.prev) {
            return None;
        }
        self.prev = now;

        match self.update(now) {
            Ok(transfer) => {
                trace!("bridge: {}", transfer);
                self.draw(transfer);
                self.last = Some(transfer);
                Some(transfer)
            }
            Err(err) => {
                warn!("bridge: update at {} skipped: {}", now, err);
                self.skipped = self.skipped.wrapping_add(1);
                None
            }
        }
    }

    /// Run the bridge forever
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    fn update(&mut self, now: u32) -> Result<Transfer, UpdateErr> {
        let code = self
            .sensor
            .read(self.config.adc_budget)
            .map_err(|_| UpdateErr::Sample)?;
        let volts_tenths = self.config.voltmeter.tenths(code);

        let seconds = self.link.exchange_u32(now)?;
        let volts_tenths = self.link.exchange_u16(volts_tenths)?;
        Ok(Transfer {
            seconds,
            volts_tenths,
        })
    }

    fn draw(&mut self, transfer: Transfer) {
        let cal = Calendar::from_seconds(transfer.seconds);
        self.display.clear();
        self.display.draw_centered(
            &text::clock(cal.hour, cal.minute, cal.second),
            CENTER_X,
            TIME_ROW,
        );
        self.display
            .draw_centered(&text::volts(transfer.volts_tenths), CENTER_X, VOLTS_ROW);
        self.display.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeDisplay, FakeSampler, LoopbackLink};

    fn bridge(counter: &TickCounter, code: u16) -> Bridge<'_, FakeDisplay, FakeSampler, LoopbackLink> {
        Bridge::new(
            FakeDisplay::default(),
            FakeSampler::new(code),
            LoopbackLink::default(),
            counter,
            BridgeConfig::default().adc_budget(100),
        )
    }

    #[test]
    fn starts_at_two_seconds() {
        let counter = TickCounter::new();
        let mut bridge = bridge(&counter, 4095);
        assert_eq!(
            bridge.step(),
            Some(Transfer {
                seconds: 2,
                volts_tenths: 33
            })
        );
        assert_eq!(bridge.display().screen(), ["00:00:02", "3.3 Volts"]);
        assert_eq!(bridge.display().position_of("00:00:02"), Some((CENTER_X, TIME_ROW)));
        assert_eq!(bridge.display().position_of("3.3 Volts"), Some((CENTER_X, VOLTS_ROW)));
    }

    #[test]
    fn sends_lsb_first() {
        let counter = TickCounter::new();
        let mut bridge = bridge(&counter, 2048);
        counter.set(0x0001_0203);
        bridge.step();
        // 2048 * 3.3 V / 4095 truncates to 1.6 V
        assert_eq!(bridge.link_mut().sent, [0x03, 0x02, 0x01, 0x00, 16, 0]);
    }

    #[test]
    fn updates_once_per_second() {
        let counter = TickCounter::new();
        let mut bridge = bridge(&counter, 0);
        assert!(bridge.step().is_some());
        assert_eq!(bridge.step(), None);
        assert_eq!(bridge.link_mut().sent.len(), 6);

        counter.set(3_725);
        let transfer = bridge.step();
        assert_eq!(transfer.map(|t| t.seconds), Some(3_725));
        assert_eq!(bridge.display().screen(), ["01:02:05", "0.0 Volts"]);
    }

    #[test]
    fn link_failure_keeps_previous_screen() {
        let counter = TickCounter::new();
        let mut bridge = bridge(&counter, 4095);
        bridge.step();
        let draws = bridge.display().log.len();

        bridge.link_mut().fail = true;
        counter.on_interrupt();
        assert_eq!(bridge.step(), None);
        assert_eq!(bridge.skipped(), 1);
        assert_eq!(bridge.display().log.len(), draws);
        assert_eq!(bridge.last().map(|t| t.seconds), Some(2));

        // Next second goes through again
        bridge.link_mut().fail = false;
        counter.on_interrupt();
        assert_eq!(bridge.step().map(|t| t.seconds), Some(4));
    }

    #[test]
    fn stuck_adc_skips_update() {
        let counter = TickCounter::new();
        let mut bridge = bridge(&counter, 0);
        bridge.sensor_mut().stuck = true;
        assert_eq!(bridge.step(), None);
        assert_eq!(bridge.skipped(), 1);
        assert!(bridge.link_mut().sent.is_empty());
    }
}
