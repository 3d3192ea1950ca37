#![no_main]
#![no_std]
#![feature(abi_msp430_interrupt)]

// Time and voltage bridge. eUSCI_B1 sends the seconds counter and the voltage on P1.1 to
// eUSCI_A0 on the same board and the display shows what arrived. See the crate docs for wiring.

use embedded_hal::spi::MODE_0;
use msp430_labs::{
    bridge::{Bridge, BridgeConfig},
    display::SerialDisplay,
    link::SpiLink,
};
use msp430_rt::entry;
use msp430fr2355::interrupt;
use msp430fr2355_labs::{FnSampler, SECONDS};
use msp430fr2x5x_hal::{
    adc::{AdcConfig, ClockDivider, Predivider, Resolution, SampleTime, SamplingRate},
    clock::{ClockConfig, DcoclkFreqSel, MclkDiv, SmclkDiv, VLOCLK},
    fram::Fram,
    gpio::Batch,
    pmm::Pmm,
    rtc::{Rtc, RtcDiv},
    serial::{BitCount, BitOrder, Loopback, Parity, SerialConfig, StopBits},
    spi::{SpiConfig, StePolarity},
    watchdog::Wdt,
};
use panic_msp430 as _;

// Spins allowed for each SPI byte
const BYTE_BUDGET: u32 = 2_000;

#[entry]
fn main() -> ! {
    let periph = msp430fr2355::Peripherals::take().unwrap();

    let mut fram = Fram::new(periph.FRCTL);
    let _wdt = Wdt::constrain(periph.WDT_A);

    let pmm = Pmm::new(periph.PMM);
    let p1 = Batch::new(periph.P1).split(&pmm);
    let sl_mosi = p1.pin7.to_alternate1();
    let sl_miso = p1.pin6.to_alternate1();
    let sl_sclk = p1.pin5.to_alternate1();
    let sl_ste = p1.pin4.to_alternate1();
    let mut volt_pin = p1.pin1.to_alternate3();

    let p4 = Batch::new(periph.P4).split(&pmm);
    let mosi = p4.pin6.to_alternate1();
    let miso = p4.pin7.to_alternate1();
    let sclk = p4.pin5.to_alternate1();
    let cs = p4.pin4.to_output();

    let (smclk, aclk, _delay) = ClockConfig::new(periph.CS)
        .mclk_dcoclk(DcoclkFreqSel::_8MHz, MclkDiv::_1)
        .smclk_on(SmclkDiv::_1)
        .aclk_refoclk()
        .freeze(&mut fram);

    let tx = SerialConfig::new(
        periph.E_USCI_A1,
        BitOrder::LsbFirst,
        BitCount::EightBits,
        StopBits::OneStopBit,
        Parity::NoParity,
        Loopback::NoLoop,
        9600,
    )
    .use_aclk(&aclk)
    .tx_only(p4.pin3.to_alternate1());
    let display = SerialDisplay::new(tx);

    let mut adc = AdcConfig::new(
        ClockDivider::_1,
        Predivider::_1,
        Resolution::_12BIT,
        SamplingRate::_50KSPS,
        SampleTime::_16,
    )
    .use_modclk()
    .configure(periph.ADC);
    let sensor = FnSampler::new(|| adc.read(&mut volt_pin));

    let slave = SpiConfig::new(periph.E_USCI_A0, MODE_0, true)
        .to_slave()
        .shared_bus(sl_miso, sl_mosi, sl_sclk, sl_ste, StePolarity::EnabledWhenLow);
    let master = SpiConfig::new(periph.E_USCI_B1, MODE_0, true)
        .to_master_using_smclk(&smclk, 80) // 8MHz / 80 = 100kHz
        .single_master_bus(miso, mosi, sclk);
    let link = SpiLink::new(master, slave, cs, BYTE_BUDGET);

    let mut rtc = Rtc::new(periph.RTC).use_vloclk();
    rtc.set_clk_div(RtcDiv::_1);
    rtc.start(VLOCLK); // Count up to VLOCLK freq -> 1 Hz period
    rtc.enable_interrupts();
    unsafe { msp430::interrupt::enable() };

    Bridge::new(display, sensor, link, &SECONDS, BridgeConfig::default()).run()
}

#[interrupt]
fn RTC() {
    // SAFETY: reading RTCIV only acknowledges the interrupt
    unsafe { &*msp430fr2355::RTC::ptr() }.rtciv.read();
    SECONDS.on_interrupt();
}

// The compiler will emit calls to the abort() compiler intrinsic if debug assertions are
// enabled (default for dev profile). MSP430 does not actually have meaningful abort() support
// so for now, we create our own in each application where debug assertions are present.
#[no_mangle]
extern "C" fn abort() -> ! {
    panic!();
}
