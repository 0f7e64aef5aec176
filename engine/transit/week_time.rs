use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

pub const MINUTE: u64 = 60;
pub const HOUR: u64 = 60 * MINUTE;
pub const DAY: u64 = 24 * HOUR;
pub const WEEK: u64 = 7 * DAY;

/**
 * Seconds since Monday 00:00 of the week a query or trip starts in. Values past `WEEK` are
 * allowed, so a trip running over the end of the week stays monotone; `time_of_week` folds
 * them back.
 */
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct WeekTime(pub u64);

impl WeekTime {
    pub fn new(weekday: Weekday, time: NaiveTime) -> Self {
        Self(weekday.num_days_from_monday() as u64 * DAY + time.num_seconds_from_midnight() as u64)
    }

    pub fn hms(weekday: Weekday, hour: u64, minute: u64, second: u64) -> Self {
        Self::from_service_day(weekday, hour * HOUR + minute * MINUTE + second)
    }

    /**
     * A time given relative to the start of a service day. Timetables count past midnight
     * (25:10:00 is 01:10 the next day), which rolls over into the following weekday.
     */
    pub fn from_service_day(weekday: Weekday, seconds: u64) -> Self {
        Self(weekday.num_days_from_monday() as u64 * DAY + seconds)
    }

    pub fn seconds(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    pub fn time_of_week(&self) -> u64 {
        self.0 % WEEK
    }

    pub fn weekday(&self) -> Weekday {
        match (self.time_of_week() / DAY) as u8 {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }

    pub fn time_of_day(&self) -> NaiveTime {
        let seconds = (self.time_of_week() % DAY) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl std::ops::Add<u64> for WeekTime {
    type Output = WeekTime;

    fn add(self, seconds: u64) -> WeekTime {
        WeekTime(self.0 + seconds)
    }
}

impl std::fmt::Display for WeekTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let time = self.time_of_day();
        write!(
            f,
            "{} {:02}:{:02}:{:02}",
            self.weekday(),
            time.hour(),
            time.minute(),
            time.second()
        )
    }
}

/** Folds an absolute time in seconds into `[0, WEEK)`. */
pub fn time_of_week(time: f64) -> f64 {
    time.rem_euclid(WEEK as f64)
}

/** Seconds to wait from `from` until the next occurrence of `to` within the weekly cycle. */
pub fn week_diff(to: f64, from: f64) -> f64 {
    (to - from).rem_euclid(WEEK as f64)
}

#[cfg(test)]
mod tests {
    use crate::week_time::*;

    #[test]
    fn construction() {
        let time = WeekTime::hms(Weekday::Tue, 8, 30, 0);
        assert_eq!(time.seconds(), DAY + 8 * HOUR + 30 * MINUTE);
        assert_eq!(time.weekday(), Weekday::Tue);
        assert_eq!(format!("{}", time), "Tue 08:30:00");

        let late = WeekTime::hms(Weekday::Sun, 25, 10, 0);
        assert_eq!(late.seconds(), WEEK + HOUR + 10 * MINUTE);
        assert_eq!(late.weekday(), Weekday::Mon);
        assert_eq!(late.time_of_week(), HOUR + 10 * MINUTE);
    }

    #[test]
    fn wrapping_difference() {
        assert_eq!(week_diff(100.0, 40.0), 60.0);
        assert_eq!(week_diff(40.0, 100.0), WEEK as f64 - 60.0);
        assert_eq!(week_diff(5.0, WEEK as f64 - 5.0), 10.0);
        assert_eq!(time_of_week(WEEK as f64 + 3.0), 3.0);
        assert_eq!(time_of_week(-1.0), WEEK as f64 - 1.0);
    }
}
