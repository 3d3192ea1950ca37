//! Board-independent core of four MSP430 course labs, written against [`embedded_hal`] traits.
//!
//! * [`simon`]: memory game played on a keypad with tones and a display
//! * [`music`]: song player with countdown, pause and speed control
//! * [`thermoclock`]: clock with an editable date and a moving average of the die temperature
//! * [`bridge`]: pushes the time and a sampled voltage through an SPI loop and shows the echo
//!
//! Each lab is a struct owning its peripherals, stepped by a state machine. Peripherals are
//! reached through small traits ([`display::Display`], [`keypad::Keypad`], [`buzzer::Buzzer`],
//! [`adc::Sampler`], [`link::ByteLink`]) so the labs run unchanged on the board and in host tests.
//! Time comes from counters advanced by interrupt handlers, see [`timer`].
//!
//! # Usage
//!
//! The `device-examples/` directory holds the board crate binding the labs to an MSP430FR2355
//! LaunchPad. Building it requires `msp430-elf-gcc` in $PATH. To flash a lab, make sure you have
//! `mspdebug` with `tilib` support installed and invoke `cargo run --release --bin lab1` from that
//! directory with the board plugged in.
//!
//! Enable the `defmt` feature to log state changes and peripheral timeouts.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

#[macro_use]
mod fmt;

pub mod adc;
pub mod average;
pub mod bridge;
pub mod buzzer;
pub mod calendar;
pub mod display;
pub mod gpio;
pub mod keypad;
pub mod link;
pub mod music;
pub mod prelude;
pub mod simon;
pub mod text;
pub mod thermoclock;
pub mod timer;

#[cfg(test)]
#[allow(dead_code)]
mod mock;
