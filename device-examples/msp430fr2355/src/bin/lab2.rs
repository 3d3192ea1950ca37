#![no_main]
#![no_std]
#![feature(abi_msp430_interrupt)]

// Music player. * opens the song menu, 1 and 2 pick a song. While playing: 1 pauses and resumes,
// 2 speeds up, 3 slows down, 4 returns to the song menu and # to the welcome screen.

use core::convert::Infallible;
use embedded_hal::digital::{InputPin, OutputPin};
use msp430_labs::{
    buzzer::PwmBuzzer,
    display::SerialDisplay,
    gpio::Leds,
    keypad::MatrixKeypad,
    music::{Player, PlayerConfig},
};
use msp430_rt::entry;
use msp430fr2355::interrupt;
use msp430fr2355_labs::{Tb3Period, MILLIS, MILLIS_RTC_MOD};
use msp430fr2x5x_hal::{
    clock::{ClockConfig, MclkDiv, SmclkDiv},
    fram::Fram,
    gpio::Batch,
    pmm::Pmm,
    pwm::{PwmParts7, TimerConfig},
    rtc::{Rtc, RtcDiv},
    serial::{BitCount, BitOrder, Loopback, Parity, SerialConfig, StopBits},
    watchdog::Wdt,
};
use panic_msp430 as _;

#[entry]
fn main() -> ! {
    let periph = msp430fr2355::Peripherals::take().unwrap();

    let mut fram = Fram::new(periph.FRCTL);
    let _wdt = Wdt::constrain(periph.WDT_A);

    let pmm = Pmm::new(periph.PMM);
    let p1 = Batch::new(periph.P1)
        .config_pin0(|p| p.to_output())
        .split(&pmm);
    let p3 = Batch::new(periph.P3)
        .config_pin0(|p| p.to_output())
        .config_pin1(|p| p.to_output())
        .config_pin2(|p| p.to_output())
        .config_pin3(|p| p.pullup())
        .config_pin4(|p| p.pullup())
        .config_pin5(|p| p.pullup())
        .config_pin6(|p| p.pullup())
        .split(&pmm);
    let p4 = Batch::new(periph.P4).split(&pmm);
    let p6 = Batch::new(periph.P6)
        .config_pin6(|p| p.to_output())
        .split(&pmm);

    // Everything runs from the 32768 Hz REFO so RTC ticks and tone periods share one time base
    let (smclk, aclk, _delay) = ClockConfig::new(periph.CS)
        .mclk_refoclk(MclkDiv::_1)
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

    let (mut c0, mut c1, mut c2) = (p3.pin0, p3.pin1, p3.pin2);
    let (mut r0, mut r1, mut r2, mut r3) = (p3.pin3, p3.pin4, p3.pin5, p3.pin6);
    let keypad = MatrixKeypad::new(
        [&mut c0 as &mut dyn OutputPin<Error = Infallible>, &mut c1, &mut c2],
        [
            &mut r0 as &mut dyn InputPin<Error = Infallible>,
            &mut r1,
            &mut r2,
            &mut r3,
        ],
    );

    let pwm = PwmParts7::new(periph.TB3, TimerConfig::aclk(&aclk), 100);
    let channel = pwm.pwm4.init(p6.pin3.to_output().to_alternate1());
    let buzzer = PwmBuzzer::new(channel, Tb3Period::new());

    let leds = Leds::new(p1.pin0, p6.pin6);

    let mut rtc = Rtc::new(periph.RTC).use_smclk(&smclk);
    rtc.set_clk_div(RtcDiv::_1);
    rtc.start(MILLIS_RTC_MOD);
    rtc.enable_interrupts();
    unsafe { msp430::interrupt::enable() };

    Player::new(display, keypad, buzzer, leds, &MILLIS, PlayerConfig::default()).run()
}

#[interrupt]
fn RTC() {
    // SAFETY: reading RTCIV only acknowledges the interrupt
    unsafe { &*msp430fr2355::RTC::ptr() }.rtciv.read();
    MILLIS.on_interrupt();
}

// The compiler will emit calls to the abort() compiler intrinsic if debug assertions are
// enabled (default for dev profile). MSP430 does not actually have meaningful abort() support
// so for now, we create our own in each application where debug assertions are present.
#[no_mangle]
extern "C" fn abort() -> ! {
    panic!();
}
