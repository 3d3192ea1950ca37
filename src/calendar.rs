//! Non-leap calendar arithmetic
//!
//! The clock counts seconds since midnight on January 1st of a year with no leap day. Seconds past
//! the end of that year wrap around to January 1st.

/// Days in each month, January first
pub const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Seconds in a minute
pub const MINUTE_SECONDS: u32 = 60;
/// Seconds in an hour
pub const HOUR_SECONDS: u32 = 60 * MINUTE_SECONDS;
/// Seconds in a day
pub const DAY_SECONDS: u32 = 24 * HOUR_SECONDS;
/// Seconds in a non-leap year
pub const YEAR_SECONDS: u32 = 365 * DAY_SECONDS;

/// Number of days in `month` (1 to 12). Out-of-range months are clamped.
#[inline]
pub fn days_in_month(month: u8) -> u8 {
    DAYS_IN_MONTH[(month.clamp(1, 12) - 1) as usize]
}

/// Broken-down time of year
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calendar {
    /// 1 to 12
    pub month: u8,
    /// 1 to the length of the month
    pub day: u8,
    /// 0 to 23
    pub hour: u8,
    /// 0 to 59
    pub minute: u8,
    /// 0 to 59
    pub second: u8,
}

impl Default for Calendar {
    /// Midnight, January 1st
    fn default() -> Self {
        Calendar {
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl Calendar {
    /// Break a seconds count down into calendar fields, wrapping modulo a year
    pub fn from_seconds(seconds: u32) -> Self {
        let seconds = seconds % YEAR_SECONDS;
        let mut day_of_year = seconds / DAY_SECONDS;
        let mut month = 1;
        for &days in DAYS_IN_MONTH.iter() {
            if day_of_year < days as u32 {
                break;
            }
            day_of_year -= days as u32;
            month += 1;
        }
        Calendar {
            month,
            day: day_of_year as u8 + 1,
            hour: (seconds / HOUR_SECONDS % 24) as u8,
            minute: (seconds / MINUTE_SECONDS % 60) as u8,
            second: (seconds % 60) as u8,
        }
    }

    /// Seconds since midnight on January 1st
    pub fn to_seconds(&self) -> u32 {
        let days_before: u32 = DAYS_IN_MONTH
            .iter()
            .take(self.month.clamp(1, 12) as usize - 1)
            .map(|&d| d as u32)
            .sum();
        let day_of_year = days_before + self.day.max(1) as u32 - 1;
        day_of_year * DAY_SECONDS
            + self.hour as u32 * HOUR_SECONDS
            + self.minute as u32 * MINUTE_SECONDS
            + self.second as u32
    }
}
