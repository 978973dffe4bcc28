// src/process/date_parser.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::types::{ClockStyle, DateOrder};

static YMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})([-/.])(\d{1,2})([-/.])(\d{1,2})$").expect("valid regex"));
static MDY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"));
static DMY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})([.-])(\d{1,2})([.-])(\d{4})$").expect("valid regex"));
static TIME_24: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?$").expect("valid regex")
});
static TIME_12: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))? ?([AaPp])[Mm]$").expect("valid regex")
});

/// Parse a calendar date whose field order is fixed by `order`.
///
/// The order is chosen purely from the textual shape: `YYYY-M-D` style is
/// year-first, `M/D/YYYY` month-first, `D.M.YYYY` / `D-M-YYYY` day-first.
pub fn parse_date(s: &str, order: DateOrder) -> Option<NaiveDate> {
    // capture group indices of (year, month, day) per order
    let (caps, (yi, mi, di)) = match order {
        DateOrder::Ymd => (YMD.captures(s)?, (1, 3, 5)),
        DateOrder::Mdy => (MDY.captures(s)?, (3, 1, 2)),
        DateOrder::Dmy => (DMY.captures(s)?, (5, 3, 1)),
    };
    if order != DateOrder::Mdy && caps[2] != caps[4] {
        return None;
    }
    let year: i32 = caps[yi].parse().ok()?;
    let month: u32 = caps[mi].parse().ok()?;
    let day: u32 = caps[di].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a wall-clock time in the given notation.
pub fn parse_time(s: &str, clock: ClockStyle) -> Option<NaiveTime> {
    match clock {
        ClockStyle::H24 => {
            let c = TIME_24.captures(s)?;
            let hour: u32 = c[1].parse().ok()?;
            let min: u32 = c[2].parse().ok()?;
            let sec: u32 = c.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
            let nanos = c.get(4).map_or(Some(0), |m| fraction_to_nanos(m.as_str()))?;
            NaiveTime::from_hms_nano_opt(hour, min, sec, nanos)
        }
        ClockStyle::H12 => {
            let c = TIME_12.captures(s)?;
            let hour: u32 = c[1].parse().ok()?;
            if !(1..=12).contains(&hour) {
                return None;
            }
            let min: u32 = c[2].parse().ok()?;
            let sec: u32 = c.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
            let pm = c[4].eq_ignore_ascii_case("p");
            let hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, false) => h,
                (h, true) => h + 12,
            };
            NaiveTime::from_hms_opt(hour, min, sec)
        }
    }
}

/// Parse a combined date and time.
///
/// Year-first values may separate the parts with `T` or a space; the other
/// orders use a single space.
pub fn parse_datetime(s: &str, clock: ClockStyle, order: DateOrder) -> Option<NaiveDateTime> {
    let (date, time) = match order {
        DateOrder::Ymd => s.split_once(['T', ' '])?,
        DateOrder::Mdy | DateOrder::Dmy => s.split_once(' ')?,
    };
    Some(NaiveDateTime::new(
        parse_date(date, order)?,
        parse_time(time, clock)?,
    ))
}

/// `"5"` → 500_000_000, `"000123"` → 123_000
fn fraction_to_nanos(digits: &str) -> Option<u32> {
    let n: u32 = digits.parse().ok()?;
    Some(n * 10u32.pow(9 - digits.len() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_follow_their_shape() {
        let may_first = NaiveDate::from_ymd_opt(2021, 5, 1).unwrap();
        assert_eq!(parse_date("2021-05-01", DateOrder::Ymd), Some(may_first));
        assert_eq!(parse_date("2021/5/1", DateOrder::Ymd), Some(may_first));
        assert_eq!(parse_date("05/01/2021", DateOrder::Mdy), Some(may_first));
        assert_eq!(parse_date("01.05.2021", DateOrder::Dmy), Some(may_first));
        assert_eq!(parse_date("1-5-2021", DateOrder::Dmy), Some(may_first));
    }

    #[test]
    fn dates_reject_mixed_separators_and_bad_values() {
        assert_eq!(parse_date("2021-05/01", DateOrder::Ymd), None);
        assert_eq!(parse_date("2021-02-30", DateOrder::Ymd), None);
        assert_eq!(parse_date("13/01/2021", DateOrder::Mdy), None);
        assert_eq!(parse_date("01/05/2021", DateOrder::Dmy), None);
        assert_eq!(parse_date("01.05-2021", DateOrder::Dmy), None);
    }

    #[test]
    fn times_in_both_notations() {
        assert_eq!(
            parse_time("23:59:58.25", ClockStyle::H24),
            NaiveTime::from_hms_milli_opt(23, 59, 58, 250)
        );
        assert_eq!(
            parse_time("7:05", ClockStyle::H24),
            NaiveTime::from_hms_opt(7, 5, 0)
        );
        assert_eq!(parse_time("24:00", ClockStyle::H24), None);
        assert_eq!(
            parse_time("12:30 AM", ClockStyle::H12),
            NaiveTime::from_hms_opt(0, 30, 0)
        );
        assert_eq!(
            parse_time("1:15:09pm", ClockStyle::H12),
            NaiveTime::from_hms_opt(13, 15, 9)
        );
        assert_eq!(parse_time("13:00 PM", ClockStyle::H12), None);
    }

    #[test]
    fn datetimes_split_on_separator() {
        let expected = NaiveDate::from_ymd_opt(2021, 12, 31)
            .unwrap()
            .and_hms_opt(18, 2, 37)
            .unwrap();
        assert_eq!(
            parse_datetime("2021-12-31T18:02:37", ClockStyle::H24, DateOrder::Ymd),
            Some(expected)
        );
        assert_eq!(
            parse_datetime("2021-12-31 18:02:37", ClockStyle::H24, DateOrder::Ymd),
            Some(expected)
        );
        assert_eq!(
            parse_datetime("12/31/2021 6:02:37 PM", ClockStyle::H12, DateOrder::Mdy),
            Some(expected)
        );
        assert_eq!(
            parse_datetime("31.12.2021 18:02:37", ClockStyle::H24, DateOrder::Dmy),
            Some(expected)
        );
        assert_eq!(
            parse_datetime("31.12.2021T18:02:37", ClockStyle::H24, DateOrder::Dmy),
            None
        );
    }
}
