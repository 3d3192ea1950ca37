//! Host-side fakes of the board collaborators used by the unit tests

use core::cell::Cell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::adc::Sampler;
use crate::buzzer::Buzzer;
use crate::display::Display;
use crate::gpio::{Indicators, LedMask};
use crate::keypad::Keypad;
use crate::link::{ByteLink, LinkErr};
use crate::timer::Monotonic;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Pin whose level is shared between all its clones. A follower pin reads the level of another
/// pin, or high when it follows nothing, like a pulled-up input left floating.
#[derive(Clone)]
pub struct SharedPin {
    level: Rc<Cell<Level>>,
    source: Option<Rc<Cell<Level>>>,
}

impl SharedPin {
    pub fn new(level: Level) -> Self {
        SharedPin {
            level: Rc::new(Cell::new(level)),
            source: None,
        }
    }

    pub fn follower(source: Option<SharedPin>) -> Self {
        SharedPin {
            level: Rc::new(Cell::new(Level::High)),
            source: source.map(|pin| pin.level),
        }
    }

    pub fn set(&self, level: Level) {
        self.level.set(level);
    }

    pub fn level(&self) -> Level {
        match &self.source {
            Some(source) => source.get(),
            None => self.level.get(),
        }
    }
}

impl ErrorType for SharedPin {
    type Error = Infallible;
}

impl OutputPin for SharedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(Level::High);
        Ok(())
    }
}

impl InputPin for SharedPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level() == Level::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level() == Level::Low)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Draw {
    Clear,
    Text(String, i32, i32),
    Line(i32, i32, i32),
    Flush,
}

/// Records every draw call
#[derive(Default)]
pub struct FakeDisplay {
    pub log: Vec<Draw>,
}

impl FakeDisplay {
    /// Text drawn since the last clear, in drawing order
    pub fn screen(&self) -> Vec<&str> {
        let start = self
            .log
            .iter()
            .rposition(|d| *d == Draw::Clear)
            .map_or(0, |i| i + 1);
        self.log[start..]
            .iter()
            .filter_map(|d| match d {
                Draw::Text(s, _, _) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Lines drawn since the last clear
    pub fn lines(&self) -> Vec<(i32, i32, i32)> {
        let start = self
            .log
            .iter()
            .rposition(|d| *d == Draw::Clear)
            .map_or(0, |i| i + 1);
        self.log[start..]
            .iter()
            .filter_map(|d| match d {
                Draw::Line(x1, x2, y) => Some((*x1, *x2, *y)),
                _ => None,
            })
            .collect()
    }

    /// Whether `text` was drawn at any point
    pub fn ever_drew(&self, text: &str) -> bool {
        self.log
            .iter()
            .any(|d| matches!(d, Draw::Text(s, _, _) if s == text))
    }

    /// Position of the most recent draw of `text`
    pub fn position_of(&self, text: &str) -> Option<(i32, i32)> {
        self.log.iter().rev().find_map(|d| match d {
            Draw::Text(s, x, y) if s == text => Some((*x, *y)),
            _ => None,
        })
    }
}

impl Display for FakeDisplay {
    fn clear(&mut self) {
        self.log.push(Draw::Clear);
    }

    fn draw_centered(&mut self, text: &str, x: i32, y: i32) {
        self.log.push(Draw::Text(text.to_string(), x, y));
    }

    fn draw_hline(&mut self, x1: i32, x2: i32, y: i32) {
        self.log.push(Draw::Line(x1, x2, y));
    }

    fn flush(&mut self) {
        self.log.push(Draw::Flush);
    }
}

/// Keypad replaying a script of readings, then reporting no key
#[derive(Default)]
pub struct ScriptedKeypad {
    script: VecDeque<Option<u8>>,
}

impl ScriptedKeypad {
    pub fn new(keys: &[Option<u8>]) -> Self {
        ScriptedKeypad {
            script: keys.iter().copied().collect(),
        }
    }

    pub fn push(&mut self, key: Option<u8>) {
        self.script.push_back(key);
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl Keypad for ScriptedKeypad {
    fn get_key(&mut self) -> Option<u8> {
        self.script.pop_front().flatten()
    }
}

/// Records every period the buzzer was started with; 0 is logged for `stop`
#[derive(Default)]
pub struct FakeBuzzer {
    pub log: Vec<u16>,
}

impl FakeBuzzer {
    pub fn sounding(&self) -> Option<u16> {
        self.log.last().copied().filter(|&p| p != 0)
    }

    pub fn tones(&self) -> Vec<u16> {
        self.log.iter().copied().filter(|&p| p != 0).collect()
    }
}

impl Buzzer for FakeBuzzer {
    fn start(&mut self, period: u16) {
        self.log.push(period);
    }

    fn stop(&mut self) {
        self.log.push(0);
    }
}

#[derive(Default)]
pub struct FakeLeds {
    pub log: Vec<LedMask>,
}

impl FakeLeds {
    pub fn lit(&self) -> LedMask {
        self.log.last().copied().unwrap_or(LedMask::empty())
    }
}

impl Indicators for FakeLeds {
    fn show(&mut self, mask: LedMask) {
        self.log.push(mask);
    }
}

/// Delay that only adds up the time it was asked to wait
#[derive(Default)]
pub struct FakeDelay {
    pub total_ms: u32,
}

impl embedded_hal::delay::DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms = self.total_ms.saturating_add(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms = self.total_ms.saturating_add(ms);
    }
}

/// Sampler returning a fixed code after `busy` polls, or never when `stuck`
pub struct FakeSampler {
    pub code: u16,
    pub busy: u32,
    pub stuck: bool,
    pending: u32,
}

impl FakeSampler {
    pub fn new(code: u16) -> Self {
        FakeSampler {
            code,
            busy: 0,
            stuck: false,
            pending: 0,
        }
    }

    pub fn stuck() -> Self {
        FakeSampler {
            stuck: true,
            ..FakeSampler::new(0)
        }
    }
}

impl Sampler for FakeSampler {
    type Error = Infallible;

    fn sample(&mut self) -> nb::Result<u16, Self::Error> {
        if self.stuck {
            return Err(nb::Error::WouldBlock);
        }
        if self.pending < self.busy {
            self.pending += 1;
            return Err(nb::Error::WouldBlock);
        }
        self.pending = 0;
        Ok(self.code)
    }
}

/// Link echoing every byte back, recording what was sent
#[derive(Default)]
pub struct LoopbackLink {
    pub sent: Vec<u8>,
    pub fail: bool,
}

impl ByteLink for LoopbackLink {
    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), LinkErr> {
        if self.fail {
            return Err(LinkErr::Timeout);
        }
        self.sent.extend_from_slice(buf);
        Ok(())
    }
}

/// Clock moved by hand
#[derive(Default)]
pub struct FakeClock {
    now: Cell<u32>,
    pub resets: Cell<u32>,
}

impl FakeClock {
    pub fn advance(&self, units: u32) {
        self.now.set(self.now.get().wrapping_add(units));
    }
}

impl Monotonic for FakeClock {
    fn now(&self) -> u32 {
        self.now.get()
    }

    fn reset(&self) {
        self.now.set(0);
        self.resets.set(self.resets.get() + 1);
    }
}
