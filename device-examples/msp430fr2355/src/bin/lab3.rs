#![no_main]
#![no_std]
#![feature(abi_msp430_interrupt)]

// Clock with a temperature log. S2 enters edit mode and confirms each field, S1 increments it.

use msp430_labs::{
    display::SerialDisplay,
    thermoclock::{ThermoClock, ThermoClockConfig},
};
use msp430_rt::entry;
use msp430fr2355::interrupt;
use msp430fr2355_labs::{code_at_1v5, temp_calibration, FnSampler, AVCC_MV, SECONDS};
use msp430fr2x5x_hal::{
    adc::{AdcConfig, ClockDivider, Predivider, Resolution, SampleTime, SamplingRate},
    clock::{ClockConfig, DcoclkFreqSel, MclkDiv, SmclkDiv, VLOCLK},
    fram::Fram,
    gpio::Batch,
    pmm::{Pmm, ReferenceVoltage},
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

    let mut pmm = Pmm::new(periph.PMM);
    let p2 = Batch::new(periph.P2)
        .config_pin3(|p| p.pullup())
        .split(&pmm);
    let p4 = Batch::new(periph.P4)
        .config_pin1(|p| p.pullup())
        .split(&pmm);

    let (_smclk, aclk, _delay) = ClockConfig::new(periph.CS)
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

    // Temp sensor needs >= 30 us sample time.
    // MODCLK is < ~4.6MHz, so 256 cycles / 4.6 MHz = 55 us sample time.
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
    let sensor = FnSampler::new(|| {
        adc.read_voltage_mv(&mut t_sense, AVCC_MV)
            .map(code_at_1v5)
    });

    let mut rtc = Rtc::new(periph.RTC).use_vloclk();
    rtc.set_clk_div(RtcDiv::_1);
    rtc.start(VLOCLK); // Count up to VLOCLK freq -> 1 Hz period
    rtc.enable_interrupts();
    unsafe { msp430::interrupt::enable() };

    let config = ThermoClockConfig::new(temp_calibration());
    ThermoClock::new(display, p2.pin3, p4.pin1, sensor, &SECONDS, config).run()
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
