//! Fixed-width text for the display
//!
//! Every string the labs draw is short and bounded, so formatting goes into a `heapless::String`
//! on the stack. Formatting into a `Line` cannot overflow for any input of the documented range;
//! out-of-range values are clamped rather than truncated mid-field.

use core::fmt::Write;
use heapless::String;

/// Capacity of one display line
pub const LINE_LEN: usize = 21;

/// One line of display text
pub type Line = String<LINE_LEN>;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Three-letter name of a month numbered from 1. Out-of-range months are clamped.
pub fn month_name(month: u8) -> &'static str {
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

/// `"JAN 01"`
pub fn date(month: u8, day: u8) -> Line {
    let mut s = Line::new();
    write!(s, "{} {:02}", month_name(month), day.min(99)).ok();
    s
}

/// `"hh:mm:ss"`
pub fn clock(hours: u8, minutes: u8, seconds: u8) -> Line {
    let mut s = Line::new();
    write!(
        s,
        "{:02}:{:02}:{:02}",
        hours.min(99),
        minutes.min(99),
        seconds.min(99)
    )
    .ok();
    s
}

/// A value in tenths as `"ddd.d U"`, e.g. `"025.3 C"`. Negative values get a leading minus.
pub fn tenths(value: i32, unit: char) -> Line {
    let mut s = Line::new();
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs().min(9999);
    write!(s, "{}{:03}.{} {}", sign, magnitude / 10, magnitude % 10, unit).ok();
    s
}

/// A voltage in tenths as `"d.d Volts"`
pub fn volts(tenths: u16) -> Line {
    let mut s = Line::new();
    write!(s, "{}.{} Volts", tenths / 10, tenths % 10).ok();
    s
}

/// A single decimal digit. Values above 9 show their last digit.
pub fn digit(n: u8) -> Line {
    let mut s = Line::new();
    s.push(char::from(b'0' + n % 10)).ok();
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_and_clocks() {
        assert_eq!(date(1, 1), "JAN 01");
        assert_eq!(date(12, 31), "DEC 31");
        assert_eq!(date(0, 5), "JAN 05");
        assert_eq!(clock(0, 0, 0), "00:00:00");
        assert_eq!(clock(23, 5, 59), "23:05:59");
    }

    #[test]
    fn temperatures() {
        assert_eq!(tenths(253, 'C'), "025.3 C");
        assert_eq!(tenths(775, 'F'), "077.5 F");
        assert_eq!(tenths(1000, 'C'), "100.0 C");
        assert_eq!(tenths(-45, 'C'), "-004.5 C");
        assert_eq!(tenths(123_456, 'C'), "999.9 C");
    }

    #[test]
    fn voltages_and_digits() {
        assert_eq!(volts(33), "3.3 Volts");
        assert_eq!(volts(0), "0.0 Volts");
        assert_eq!(digit(3), "3");
        assert_eq!(digit(12), "2");
        assert_eq!(month_name(13), "DEC");
    }
}
