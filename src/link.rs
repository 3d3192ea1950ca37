//! Byte-wise synchronous link
//!
//! Values cross the link one byte at a time, least significant byte first. Every byte written by
//! the master is read back on the slave side, so after an exchange the buffer holds what the peer
//! actually received. There is no framing beyond the chip select, no acknowledgement and no
//! checksum: a dropped byte shifts every following byte of the value.

use crate::timer::{poll, PollErr};
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::ErrorKind;
use embedded_hal_nb::spi::FullDuplex;

/// Errors that can occur while exchanging bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkErr {
    /// A byte was not accepted or not received within the spin budget
    Timeout,
    /// The SPI peripheral reported an error
    Bus(ErrorKind),
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkErr {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LinkErr::Timeout => defmt::write!(f, "Timeout"),
            LinkErr::Bus(kind) => defmt::write!(f, "Bus({})", defmt::Debug2Format(kind)),
        }
    }
}

impl<E: embedded_hal::spi::Error> From<PollErr<E>> for LinkErr {
    fn from(err: PollErr<E>) -> Self {
        match err {
            PollErr::Timeout => LinkErr::Timeout,
            PollErr::Other(e) => LinkErr::Bus(e.kind()),
        }
    }
}

/// Synchronous byte exchange with a peer
pub trait ByteLink {
    /// Send every byte of `buf` in order, replacing each one with the byte the peer received
    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), LinkErr>;

    /// Send a 32-bit value least significant byte first and reassemble what the peer received
    fn exchange_u32(&mut self, value: u32) -> Result<u32, LinkErr> {
        let mut bytes = value.to_le_bytes();
        self.exchange(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Send a 16-bit value least significant byte first and reassemble what the peer received
    fn exchange_u16(&mut self, value: u16) -> Result<u16, LinkErr> {
        let mut bytes = value.to_le_bytes();
        self.exchange(&mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }
}

impl<T: ByteLink + ?Sized> ByteLink for &mut T {
    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), LinkErr> {
        (**self).exchange(buf)
    }
}

/// Master and slave SPI peripherals wired to each other on the same board.
///
/// The master drives the chip select low for the whole of each `exchange`, writes one byte at a
/// time and waits for the slave to receive it. Each wait is bounded by `budget` spins.
pub struct SpiLink<M, S, CS> {
    master: M,
    slave: S,
    cs: CS,
    budget: u32,
}

impl<M, S, CS> SpiLink<M, S, CS>
where
    M: FullDuplex<u8>,
    S: FullDuplex<u8>,
    CS: OutputPin,
{
    /// Take both SPI peripherals and the chip select pin. The chip select is released (high).
    pub fn new(master: M, slave: S, mut cs: CS, budget: u32) -> Self {
        cs.set_high().ok();
        SpiLink {
            master,
            slave,
            cs,
            budget,
        }
    }

    /// Release the peripherals and pin
    pub fn free(self) -> (M, S, CS) {
        (self.master, self.slave, self.cs)
    }

    fn transfer(&mut self, byte: u8) -> Result<u8, LinkErr> {
        let master = &mut self.master;
        let slave = &mut self.slave;
        poll(self.budget, || master.write(byte))?;
        let received = poll(self.budget, || slave.read())?;
        // Drain whatever the slave shifted back so the master's receive flag is clear
        poll(self.budget, || master.read())?;
        Ok(received)
    }
}

impl<M, S, CS> ByteLink for SpiLink<M, S, CS>
where
    M: FullDuplex<u8>,
    S: FullDuplex<u8>,
    CS: OutputPin,
{
    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), LinkErr> {
        self.cs.set_low().ok();
        let res: Result<(), LinkErr> = buf.iter_mut().try_for_each(|byte| {
            *byte = self.transfer(*byte)?;
            Ok(())
        });
        self.cs.set_high().ok();
        if let Err(err) = &res {
            warn!("link exchange failed: {}", err);
        }
        res
    }
}
