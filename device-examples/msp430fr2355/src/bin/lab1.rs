#![no_main]
#![no_std]

// Simon memory game. Press * on the keypad to start, then repeat the digits.

use core::convert::Infallible;
use embedded_hal::digital::{InputPin, OutputPin};
use msp430_labs::{
    buzzer::PwmBuzzer,
    display::SerialDisplay,
    keypad::MatrixKeypad,
    simon::{Simon, SimonConfig},
};
use msp430_rt::entry;
use msp430fr2355_labs::{seed_from, FnSampler, Tb3Period, AVCC_MV};
use msp430fr2x5x_hal::{
    adc::{AdcConfig, ClockDivider, Predivider, Resolution, SampleTime, SamplingRate},
    clock::{ClockConfig, DcoclkFreqSel, MclkDiv, SmclkDiv},
    fram::Fram,
    gpio::Batch,
    pmm::{Pmm, ReferenceVoltage},
    pwm::{PwmParts7, TimerConfig},
    serial::{BitCount, BitOrder, Loopback, Parity, SerialConfig, StopBits},
    watchdog::Wdt,
};
use panic_msp430 as _;

#[entry]
fn main() -> ! {
    let periph = msp430fr2355::Peripherals::take().unwrap();

    let mut fram = Fram::new(periph.FRCTL);
    let _wdt = Wdt::constrain(periph.WDT_A);

    let mut pmm = Pmm::new(periph.PMM);
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
    let p6 = Batch::new(periph.P6).split(&pmm);

    let (_smclk, aclk, delay) = ClockConfig::new(periph.CS)
        .mclk_dcoclk(DcoclkFreqSel::_1MHz, MclkDiv::_1)
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

    // Periods are set per tone, the initial one is never heard
    let pwm = PwmParts7::new(periph.TB3, TimerConfig::aclk(&aclk), 100);
    let channel = pwm.pwm4.init(p6.pin3.to_output().to_alternate1());
    let buzzer = PwmBuzzer::new(channel, Tb3Period::new());

    // The temperature sensor's noise seeds the digit sequence
    let mut adc = AdcConfig::new(
        ClockDivider::_1,
        Predivider::_1,
        Resolution::_12BIT,
        SamplingRate::_200KSPS,
        SampleTime::_256,
    )
    .use_modclk()
    .configure(periph.ADC);
    let vref = pmm.enable_internal_reference(ReferenceVoltage::_1V5);
    let mut t_sense = pmm.enable_internal_temp_sensor(&vref);
    let mut noise = FnSampler::new(|| adc.read_voltage_mv(&mut t_sense, AVCC_MV));
    let seed = seed_from(&mut noise, 1_000);

    Simon::new(display, keypad, buzzer, delay, SimonConfig::default(), seed).run()
}

// The compiler will emit calls to the abort() compiler intrinsic if debug assertions are
// enabled (default for dev profile). MSP430 does not actually have meaningful abort() support
// so for now, we create our own in each application where debug assertions are present.
#[no_mangle]
extern "C" fn abort() -> ! {
    panic!();
}
