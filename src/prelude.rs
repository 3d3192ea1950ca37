//! Prelude

pub use crate::adc::Sampler as _msp430_labs_Sampler;
pub use crate::buzzer::Buzzer as _msp430_labs_Buzzer;
pub use crate::buzzer::PeriodControl as _msp430_labs_PeriodControl;
pub use crate::display::Display as _msp430_labs_Display;
pub use crate::gpio::Indicators as _msp430_labs_Indicators;
pub use crate::keypad::Keypad as _msp430_labs_Keypad;
pub use crate::link::ByteLink as _msp430_labs_ByteLink;
pub use crate::timer::Monotonic as _msp430_labs_Monotonic;
