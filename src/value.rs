//! Date/time values for the PIC32 RTCC.
//!
//! A [`TimeValue`] is a snapshot of the two packed BCD words the RTCC keeps
//! (date and time) plus a [`Validity`] tag recording where the time came from.
//! It can be read or written field by field, checked with
//! [`TimeValue::is_valid`], and converted to:
//!
//! - a compact 32-bit integer ([`TimeValue::to_compact`]) using a fixed
//!   31-day month, 12-month year radix. It sorts like the date but is not a
//!   real calendar count.
//! - a Unix timestamp ([`TimeValue::timestamp`]) using the real Gregorian
//!   calendar, without any timezone or daylight saving adjustment.
//! - chrono's `NaiveDateTime`, through `TryFrom` in both directions.
//!
//! # Permissive setters
//!
//! Field setters never reject input. A value outside 0..=99 is packed with
//! wrapping BCD arithmetic, so `set_hours(200)` stores a lane that decodes as
//! 40 and the value stops being valid. The `try_set_*` variants are the strict
//! alternative and return [`TimeValueError::FieldOutOfRange`] instead.
//!
//! # Year window
//!
//! The year lane holds two BCD digits, so only 2000-2099 is representable.
//! Conversions outside that window do not panic, but their results are
//! unspecified.

use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::registers::{PackedDate, PackedTime};

const EPOCH_YEAR: u32 = 1970;
const CENTURY_BASE: u32 = 2000;
const SECS_PER_MIN: u32 = 60;
const SECS_PER_HOUR: u32 = 60 * SECS_PER_MIN;
const SECS_PER_DAY: u32 = 24 * SECS_PER_HOUR;
const COMPACT_DAYS_PER_MONTH: u32 = 31;
const COMPACT_MONTHS_PER_YEAR: u32 = 12;

/// Unix timestamp of 2000-01-01 00:00:00, the first instant the RTCC can hold.
pub const Y2K_TIMESTAMP: u32 = 946_684_800;

// Days per month, January first
const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Packs a decimal value into one BCD byte.
///
/// Only 0..=99 round-trips. Larger values wrap: the tens digit is shifted
/// past the top of the byte and silently truncated.
pub const fn decimal_to_bcd(decimal: u8) -> u8 {
    ((decimal / 10) << 4) | (decimal % 10)
}

/// Unpacks one BCD byte into its decimal value.
///
/// Nibbles above 9 are not rejected; `0xFF` decodes as 165.
pub const fn bcd_to_decimal(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

fn is_leap_year(year: u32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_year(year: u32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

// `month` counts from 0 for January.
fn days_in_month(year: u32, month: usize) -> u32 {
    if month == 1 && is_leap_year(year) {
        29
    } else {
        MONTH_DAYS[month]
    }
}

/// Confidence in the current date/time, by where it came from.
///
/// Levels are ordered: a higher level should not be overwritten by a lower one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validity {
    /// Never set since power on
    #[default]
    Unset = 0,
    /// Firmware build date/time
    CompileTime = 1,
    /// Received from another device
    Peer = 2,
    /// Entered by hand
    Manual = 3,
    /// Taken from a cellular network
    Network = 4,
    /// Taken from an authoritative time source such as NTP
    Authoritative = 5,
}

impl TryFrom<u8> for Validity {
    type Error = TimeValueError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Ok(match v {
            0 => Validity::Unset,
            1 => Validity::CompileTime,
            2 => Validity::Peer,
            3 => Validity::Manual,
            4 => Validity::Network,
            5 => Validity::Authoritative,
            _ => return Err(TimeValueError::InvalidValidity(v)),
        })
    }
}
impl From<Validity> for u8 {
    fn from(v: Validity) -> Self {
        v as u8
    }
}

/// Calendar field of a [`TimeValue`], used in error reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Year,
    Month,
    Day,
    Weekday,
    Hours,
    Minutes,
    Seconds,
}

/// Errors that can occur when validating or converting a [`TimeValue`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeValueError {
    /// The fields do not form a real calendar date and time
    InvalidDateTime,
    /// The year falls outside 2000-2099
    YearOutOfRange(i32),
    /// Not one of the defined [`Validity`] levels
    InvalidValidity(u8),
    /// A strict setter was given a value outside the field's range
    FieldOutOfRange(Field, u8),
}

/// A date/time as held by the RTCC, with its validity tag.
///
/// The date word packs `{year, month, day, weekday}` and the time word packs
/// `{hours, minutes, seconds, reserved}`, most significant byte first, one BCD
/// byte per field. Weekday is whatever was last written; it is not derived
/// from the date, except by [`TimeValue::set_timestamp`] which counts Sunday
/// as 1.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TimeValue {
    date: PackedDate,
    time: PackedTime,
    validity: Validity,
}

// Generates the decoded getter, the permissive setter and the strict setter
// for each BCD lane.
macro_rules! lane_accessors {
    ($(($name:ident, $word:ident, $kind:ident, $min:expr, $max:expr)),+ $(,)?) => {
        $(
            paste::paste! {
                #[doc = concat!("Returns the decoded ", stringify!($name), " lane.")]
                pub fn $name(&self) -> u8 {
                    bcd_to_decimal(self.$word.$name())
                }

                #[doc = concat!("Sets the ", stringify!($name), " lane. Out of range values are stored as given.")]
                pub fn [<set_ $name>](&mut self, value: u8) {
                    self.$word.[<set_ $name>](decimal_to_bcd(value));
                }

                #[doc = concat!(
                    "Sets the ", stringify!($name), " lane, rejecting values outside ",
                    stringify!($min), "..=", stringify!($max), "."
                )]
                pub fn [<try_set_ $name>](&mut self, value: u8) -> Result<(), TimeValueError> {
                    if !($min..=$max).contains(&value) {
                        return Err(TimeValueError::FieldOutOfRange(Field::$kind, value));
                    }
                    self.[<set_ $name>](value);
                    Ok(())
                }
            }
        )+
    };
}

impl TimeValue {
    /// Creates a value from raw date and time words.
    pub const fn new(date: u32, time: u32, validity: Validity) -> Self {
        Self {
            date: PackedDate(date),
            time: PackedTime(time),
            validity,
        }
    }

    /// Creates a value from a Unix timestamp. See [`TimeValue::set_timestamp`].
    pub fn from_timestamp(timestamp: u32, validity: Validity) -> Self {
        let mut value = Self::new(0, 0, validity);
        value.set_timestamp(timestamp);
        value
    }

    /// Creates a value from its compact form. See [`TimeValue::set_compact`].
    pub fn from_compact(compact: u32, validity: Validity) -> Self {
        let mut value = Self::new(0, 0, validity);
        value.set_compact(compact);
        value
    }

    /// Raw date word, as written to RTCDATE.
    pub const fn packed_date(&self) -> u32 {
        self.date.0
    }

    /// Raw time word, as written to RTCTIME.
    pub const fn packed_time(&self) -> u32 {
        self.time.0
    }

    pub const fn validity(&self) -> Validity {
        self.validity
    }

    pub fn set_validity(&mut self, validity: Validity) {
        self.validity = validity;
    }

    lane_accessors!(
        (year, date, Year, 0, 99),
        (month, date, Month, 1, 12),
        (day, date, Day, 1, 31),
        (weekday, date, Weekday, 1, 7),
        (hours, time, Hours, 0, 23),
        (minutes, time, Minutes, 0, 59),
        (seconds, time, Seconds, 0, 59),
    );

    /// Sets year, month and day in one go, keeping the weekday lane.
    pub fn set_ymd(&mut self, year: u8, month: u8, day: u8) {
        self.set_year(year);
        self.set_month(month);
        self.set_day(day);
    }

    /// Sets hours, minutes and seconds in one go, keeping the reserved lane.
    pub fn set_hms(&mut self, hours: u8, minutes: u8, seconds: u8) {
        self.set_hours(hours);
        self.set_minutes(minutes);
        self.set_seconds(seconds);
    }

    /// Checks that every calendar field is within its natural range.
    ///
    /// This is the only way to spot a clock that was never set: after power
    /// on the registers hold whatever the silicon left there. Day of month is
    /// checked against 31 regardless of the month, and weekday is not checked.
    pub fn is_valid(&self) -> bool {
        self.year() <= 99
            && (1..=12).contains(&self.month())
            && (1..=31).contains(&self.day())
            && self.hours() <= 23
            && self.minutes() <= 59
            && self.seconds() <= 59
    }

    /// Packs the six calendar fields into one sortable integer.
    ///
    /// Every month counts as 31 days and every year as 12 such months, so the
    /// result orders like the date but differs from a Unix timestamp. Returns
    /// 0 for an invalid value, which is also the encoding of
    /// 2000-01-01 00:00:00; call [`TimeValue::is_valid`] first when that
    /// matters.
    pub fn to_compact(&self) -> u32 {
        if !self.is_valid() {
            return 0;
        }
        let days = (u32::from(self.year()) * COMPACT_MONTHS_PER_YEAR
            + u32::from(self.month()) - 1)
            * COMPACT_DAYS_PER_MONTH
            + u32::from(self.day())
            - 1;
        days * SECS_PER_DAY
            + u32::from(self.hours()) * SECS_PER_HOUR
            + u32::from(self.minutes()) * SECS_PER_MIN
            + u32::from(self.seconds())
    }

    /// Unpacks a compact integer produced by [`TimeValue::to_compact`].
    ///
    /// Never fails and does not check the result; the weekday lane is kept.
    pub fn set_compact(&mut self, compact: u32) {
        let mut rest = compact;
        let seconds = rest % 60;
        rest /= 60;
        let minutes = rest % 60;
        rest /= 60;
        let hours = rest % 24;
        rest /= 24;
        let day = rest % COMPACT_DAYS_PER_MONTH + 1;
        rest /= COMPACT_DAYS_PER_MONTH;
        let month = rest % COMPACT_MONTHS_PER_YEAR + 1;
        // u32::MAX decodes to year 133, which still fits in a byte
        let year = rest / COMPACT_MONTHS_PER_YEAR;
        self.set_ymd(year as u8, month as u8, day as u8);
        self.set_hms(hours as u8, minutes as u8, seconds as u8);
    }

    /// Seconds since 1970-01-01 00:00:00, treating the value as UTC.
    ///
    /// No bounds checking is done. Garbage fields give a garbage result, but
    /// the arithmetic wraps rather than panicking.
    pub fn timestamp(&self) -> u32 {
        let year = CENTURY_BASE + u32::from(self.year());
        let mut days: u32 = (EPOCH_YEAR..year).map(days_in_year).sum();
        let month = usize::from(self.month()).min(MONTH_DAYS.len() + 1);
        for m in 1..month {
            days = days.wrapping_add(days_in_month(year, m - 1));
        }
        days = days.wrapping_add(u32::from(self.day()).wrapping_sub(1));
        days.wrapping_mul(SECS_PER_DAY)
            .wrapping_add(u32::from(self.hours()) * SECS_PER_HOUR)
            .wrapping_add(u32::from(self.minutes()) * SECS_PER_MIN)
            .wrapping_add(u32::from(self.seconds()))
    }

    /// Sets every field, weekday included, from a Unix timestamp.
    ///
    /// Weekday counts Sunday as 1. The year lane keeps the year modulo 100, so
    /// timestamps before 2000 or after 2099 alias into the window.
    pub fn set_timestamp(&mut self, timestamp: u32) {
        let mut rest = timestamp;
        let seconds = rest % 60;
        rest /= 60;
        let minutes = rest % 60;
        rest /= 60;
        let hours = rest % 24;
        rest /= 24;

        // 1970-01-01 was a Thursday
        let weekday = (rest + 4) % 7 + 1;

        let mut year = EPOCH_YEAR;
        while rest >= days_in_year(year) {
            rest -= days_in_year(year);
            year += 1;
        }

        let mut month = 0;
        while month < MONTH_DAYS.len() - 1 && rest >= days_in_month(year, month) {
            rest -= days_in_month(year, month);
            month += 1;
        }

        self.set_ymd((year % 100) as u8, month as u8 + 1, rest as u8 + 1);
        self.set_weekday(weekday as u8);
        self.set_hms(hours as u8, minutes as u8, seconds as u8);
    }
}

impl fmt::Display for TimeValue {
    /// Formats as `yy-mm-dd hh:mm:ss`, digit by digit from the BCD lanes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}-{:02x}-{:02x} {:02x}:{:02x}:{:02x}",
            self.date.year(),
            self.date.month(),
            self.date.day(),
            self.time.hours(),
            self.time.minutes(),
            self.time.seconds()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimeValue {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "TimeValue(date {:#x}, time {:#x}, {})",
            self.date.0,
            self.time.0,
            self.validity
        );
    }
}

impl TryFrom<TimeValue> for NaiveDateTime {
    type Error = TimeValueError;

    fn try_from(value: TimeValue) -> Result<Self, Self::Error> {
        if !value.is_valid() {
            return Err(TimeValueError::InvalidDateTime);
        }
        NaiveDate::from_ymd_opt(
            CENTURY_BASE as i32 + i32::from(value.year()),
            u32::from(value.month()),
            u32::from(value.day()),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(value.hours()),
                u32::from(value.minutes()),
                u32::from(value.seconds()),
            )
        })
        .ok_or(TimeValueError::InvalidDateTime)
    }
}

impl TryFrom<&NaiveDateTime> for TimeValue {
    type Error = TimeValueError;

    /// Converts a chrono date/time, with validity [`Validity::Unset`].
    fn try_from(datetime: &NaiveDateTime) -> Result<Self, Self::Error> {
        let year = datetime.year();
        if !(2000..=2099).contains(&year) {
            error!("year {} is outside 2000-2099", year);
            return Err(TimeValueError::YearOutOfRange(year));
        }
        let narrow = |v: u32| u8::try_from(v).map_err(|_| TimeValueError::InvalidDateTime);

        let mut value = TimeValue::default();
        value.set_ymd(
            u8::try_from(year - 2000).map_err(|_| TimeValueError::YearOutOfRange(year))?,
            narrow(datetime.month())?,
            narrow(datetime.day())?,
        );
        value.set_weekday(narrow(datetime.weekday().num_days_from_sunday() + 1)?);
        value.set_hms(
            narrow(datetime.hour())?,
            narrow(datetime.minute())?,
            narrow(datetime.second())?,
        );
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: u8, mo: u8, d: u8, h: u8, mi: u8, s: u8) -> TimeValue {
        let mut value = TimeValue::default();
        value.set_ymd(y, mo, d);
        value.set_hms(h, mi, s);
        value
    }

    fn chrono_reference(y: u8, mo: u8, d: u8, h: u8, mi: u8, s: u8) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000 + i32::from(y), u32::from(mo), u32::from(d))
            .unwrap()
            .and_hms_opt(u32::from(h), u32::from(mi), u32::from(s))
            .unwrap()
    }

    #[test]
    fn test_bcd_conversions() {
        assert_eq!(decimal_to_bcd(0), 0x00);
        assert_eq!(decimal_to_bcd(9), 0x09);
        assert_eq!(decimal_to_bcd(10), 0x10);
        assert_eq!(decimal_to_bcd(59), 0x59);
        assert_eq!(decimal_to_bcd(99), 0x99);
        assert_eq!(bcd_to_decimal(0x45), 45);
        for d in 0..=99 {
            assert_eq!(bcd_to_decimal(decimal_to_bcd(d)), d);
        }
    }

    #[test]
    fn test_bcd_out_of_range_wraps() {
        // tens digit 20 no longer fits in a nibble
        assert_eq!(decimal_to_bcd(200), 0x40);
        assert_eq!(bcd_to_decimal(0xFF), 165);
    }

    #[test]
    fn test_field_accessors_touch_one_lane() {
        let mut value = TimeValue::new(0x2403_1405, 0x1530_00AB, Validity::Manual);
        assert_eq!(value.year(), 24);
        assert_eq!(value.month(), 3);
        assert_eq!(value.day(), 14);
        assert_eq!(value.weekday(), 5);
        assert_eq!(value.hours(), 15);
        assert_eq!(value.minutes(), 30);
        assert_eq!(value.seconds(), 0);

        value.set_month(11);
        assert_eq!(value.packed_date(), 0x2411_1405);
        value.set_weekday(2);
        assert_eq!(value.packed_date(), 0x2411_1402);
        value.set_seconds(42);
        assert_eq!(value.packed_time(), 0x1530_42AB);
        value.set_hms(1, 2, 3);
        assert_eq!(value.packed_time(), 0x0102_03AB);
        value.set_ymd(99, 12, 31);
        assert_eq!(value.packed_date(), 0x9912_3102);
        assert_eq!(value.validity(), Validity::Manual);
    }

    #[test]
    fn test_is_valid_bounds() {
        assert!(ymd_hms(0, 1, 1, 0, 0, 0).is_valid());
        assert!(ymd_hms(99, 12, 31, 23, 59, 59).is_valid());

        assert!(!ymd_hms(99, 12, 31, 23, 59, 60).is_valid());
        assert!(!ymd_hms(99, 12, 31, 23, 60, 59).is_valid());
        assert!(!ymd_hms(99, 12, 31, 24, 59, 59).is_valid());
        assert!(!ymd_hms(99, 12, 32, 23, 59, 59).is_valid());
        assert!(!ymd_hms(99, 13, 31, 23, 59, 59).is_valid());
        assert!(!ymd_hms(99, 0, 31, 23, 59, 59).is_valid());
        assert!(!ymd_hms(99, 12, 0, 23, 59, 59).is_valid());
        assert!(!ymd_hms(100, 12, 31, 23, 59, 59).is_valid());
    }

    #[test]
    fn test_uninitialised_registers_are_invalid() {
        assert!(!TimeValue::default().is_valid());
        assert!(!TimeValue::new(0xFFFF_FFFF, 0xFFFF_FFFF, Validity::Unset).is_valid());
    }

    #[test]
    fn test_out_of_range_setter_is_silent() {
        let mut value = ymd_hms(24, 3, 14, 15, 30, 0);
        value.set_hours(200);
        assert_eq!(value.packed_time() >> 24, 0x40);
        assert_eq!(value.hours(), 40);
        assert!(!value.is_valid());
    }

    #[test]
    fn test_strict_setters() {
        let mut value = ymd_hms(24, 3, 14, 15, 30, 0);
        assert_eq!(
            value.try_set_hours(24),
            Err(TimeValueError::FieldOutOfRange(Field::Hours, 24))
        );
        assert_eq!(
            value.try_set_month(0),
            Err(TimeValueError::FieldOutOfRange(Field::Month, 0))
        );
        assert_eq!(
            value.try_set_weekday(8),
            Err(TimeValueError::FieldOutOfRange(Field::Weekday, 8))
        );
        assert_eq!(value.hours(), 15);
        assert_eq!(value.month(), 3);

        value.try_set_seconds(59).unwrap();
        value.try_set_day(31).unwrap();
        assert_eq!(value.seconds(), 59);
        assert_eq!(value.day(), 31);
    }

    #[test]
    fn test_validity_conversions_and_order() {
        assert_eq!(Validity::try_from(0).unwrap(), Validity::Unset);
        assert_eq!(Validity::try_from(5).unwrap(), Validity::Authoritative);
        assert_eq!(
            Validity::try_from(6),
            Err(TimeValueError::InvalidValidity(6))
        );
        assert_eq!(u8::from(Validity::Network), 4);
        assert!(Validity::Unset < Validity::CompileTime);
        assert!(Validity::CompileTime < Validity::Peer);
        assert!(Validity::Peer < Validity::Manual);
        assert!(Validity::Manual < Validity::Network);
        assert!(Validity::Network < Validity::Authoritative);
    }

    #[test]
    fn test_compact_known_values() {
        assert_eq!(ymd_hms(0, 1, 1, 0, 0, 0).to_compact(), 0);
        assert_eq!(ymd_hms(0, 1, 1, 0, 0, 1).to_compact(), 1);
        assert_eq!(ymd_hms(0, 1, 2, 0, 0, 0).to_compact(), SECS_PER_DAY);
        // February gets a full 31 days in the compact form
        assert_eq!(ymd_hms(0, 2, 1, 0, 0, 0).to_compact(), 31 * SECS_PER_DAY);
        assert_eq!(
            ymd_hms(1, 1, 1, 0, 0, 0).to_compact(),
            12 * 31 * SECS_PER_DAY
        );
    }

    #[test]
    fn test_compact_invalid_is_zero() {
        let mut value = ymd_hms(24, 3, 14, 15, 30, 0);
        value.set_seconds(60);
        assert_eq!(value.to_compact(), 0);
    }

    #[test]
    fn test_compact_round_trip() {
        let samples = [
            (0, 1, 1, 0, 0, 0),
            (24, 3, 14, 15, 30, 0),
            (0, 2, 29, 12, 0, 0),
            (50, 6, 30, 6, 7, 8),
            (99, 12, 31, 23, 59, 59),
        ];
        for (y, mo, d, h, mi, s) in samples {
            let value = ymd_hms(y, mo, d, h, mi, s);
            let back = TimeValue::from_compact(value.to_compact(), Validity::Peer);
            assert_eq!(
                (back.year(), back.month(), back.day()),
                (y, mo, d),
                "date for {}",
                value
            );
            assert_eq!(
                (back.hours(), back.minutes(), back.seconds()),
                (h, mi, s),
                "time for {}",
                value
            );
            assert_eq!(back.validity(), Validity::Peer);
        }
    }

    #[test]
    fn test_compact_is_monotonic() {
        let earlier = ymd_hms(24, 1, 31, 23, 59, 59);
        let later = ymd_hms(24, 2, 1, 0, 0, 0);
        assert!(earlier.to_compact() < later.to_compact());
    }

    #[test]
    fn test_set_compact_keeps_weekday() {
        let mut value = TimeValue::new(0x0000_0003, 0, Validity::Unset);
        value.set_compact(ymd_hms(24, 3, 14, 15, 30, 0).to_compact());
        assert_eq!(value.weekday(), 3);
        assert_eq!(value.day(), 14);
    }

    #[test]
    fn test_timestamp_y2k_anchor() {
        assert_eq!(ymd_hms(0, 1, 1, 0, 0, 0).timestamp(), Y2K_TIMESTAMP);
        assert_eq!(Y2K_TIMESTAMP, 946_684_800);
    }

    #[test]
    fn test_timestamp_leap_day() {
        let leap_day = ymd_hms(0, 2, 29, 0, 0, 0);
        let march_first = ymd_hms(0, 3, 1, 0, 0, 0);
        assert!(leap_day.is_valid());
        assert_eq!(march_first.timestamp() - leap_day.timestamp(), 86_400);

        // 2100 would not be a leap year, but 2004 is and 2001 is not
        assert_eq!(
            ymd_hms(4, 3, 1, 0, 0, 0).timestamp() - ymd_hms(4, 2, 28, 0, 0, 0).timestamp(),
            2 * 86_400
        );
        assert_eq!(
            ymd_hms(1, 3, 1, 0, 0, 0).timestamp() - ymd_hms(1, 2, 28, 0, 0, 0).timestamp(),
            86_400
        );
    }

    #[test]
    fn test_timestamp_matches_chrono() {
        let samples = [
            (0, 1, 1, 0, 0, 0),
            (0, 12, 31, 23, 59, 59),
            (4, 2, 29, 6, 30, 15),
            (24, 3, 14, 15, 30, 0),
            (38, 1, 19, 3, 14, 8),
            (77, 7, 4, 12, 0, 0),
            (99, 12, 31, 23, 59, 59),
        ];
        for (y, mo, d, h, mi, s) in samples {
            let expected = chrono_reference(y, mo, d, h, mi, s).and_utc().timestamp();
            let value = ymd_hms(y, mo, d, h, mi, s);
            assert_eq!(i64::from(value.timestamp()), expected, "timestamp of {}", value);
        }
    }

    #[test]
    fn test_from_timestamp_round_trip_with_weekday() {
        let samples = [
            (0, 1, 1, 0, 0, 0),
            (0, 2, 29, 23, 59, 59),
            (0, 3, 1, 0, 0, 0),
            (24, 3, 14, 15, 30, 0),
            (24, 12, 31, 12, 0, 0),
            (99, 12, 31, 23, 59, 59),
        ];
        for (y, mo, d, h, mi, s) in samples {
            let reference = chrono_reference(y, mo, d, h, mi, s);
            let timestamp = ymd_hms(y, mo, d, h, mi, s).timestamp();
            let back = TimeValue::from_timestamp(timestamp, Validity::Authoritative);
            assert_eq!((back.year(), back.month(), back.day()), (y, mo, d));
            assert_eq!((back.hours(), back.minutes(), back.seconds()), (h, mi, s));
            let weekday = reference.weekday().num_days_from_sunday() as u8 + 1;
            assert_eq!(back.weekday(), weekday, "weekday of {}", reference);
            assert_eq!(back.validity(), Validity::Authoritative);
        }
    }

    #[test]
    fn test_set_timestamp_epoch_weekday() {
        // 1970-01-01 was a Thursday, 2000-01-01 a Saturday
        assert_eq!(TimeValue::from_timestamp(0, Validity::Unset).weekday(), 5);
        assert_eq!(
            TimeValue::from_timestamp(Y2K_TIMESTAMP, Validity::Unset).weekday(),
            7
        );
    }

    #[test]
    fn test_timestamp_of_garbage_does_not_panic() {
        let value = TimeValue::new(0xFFFF_FFFF, 0xFFFF_FFFF, Validity::Unset);
        let _ = value.timestamp();
        let value = TimeValue::new(0x2400_0000, 0, Validity::Unset);
        let _ = value.timestamp();
    }

    #[test]
    fn test_display() {
        extern crate alloc;

        let value = TimeValue::new(0x2403_1405, 0x1530_0700, Validity::Manual);
        assert_eq!(alloc::format!("{}", value), "24-03-14 15:30:07");
    }

    #[test]
    fn test_into_naive_datetime() {
        let value = ymd_hms(24, 3, 14, 15, 30, 0);
        let dt = NaiveDateTime::try_from(value).unwrap();
        assert_eq!(dt, chrono_reference(24, 3, 14, 15, 30, 0));

        // passes the range check but is not a real date
        let value = ymd_hms(1, 2, 30, 0, 0, 0);
        assert!(value.is_valid());
        assert_eq!(
            NaiveDateTime::try_from(value),
            Err(TimeValueError::InvalidDateTime)
        );

        let value = ymd_hms(24, 13, 1, 0, 0, 0);
        assert_eq!(
            NaiveDateTime::try_from(value),
            Err(TimeValueError::InvalidDateTime)
        );
    }

    #[test]
    fn test_from_naive_datetime() {
        let dt = chrono_reference(24, 3, 14, 15, 30, 0);
        let value = TimeValue::try_from(&dt).unwrap();
        assert_eq!(value.packed_date(), 0x2403_1405);
        assert_eq!(value.packed_time(), 0x1530_0000);
        assert_eq!(value.validity(), Validity::Unset);
    }

    #[test]
    fn test_from_naive_datetime_year_window() {
        let early = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(
            TimeValue::try_from(&early),
            Err(TimeValueError::YearOutOfRange(1999))
        );

        let late = NaiveDate::from_ymd_opt(2100, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            TimeValue::try_from(&late),
            Err(TimeValueError::YearOutOfRange(2100))
        );
    }

    #[test]
    fn test_error_debug_formatting() {
        extern crate alloc;

        let debug_str = alloc::format!("{:?}", TimeValueError::FieldOutOfRange(Field::Day, 32));
        assert!(debug_str.contains("FieldOutOfRange"));
        assert!(debug_str.contains("Day"));
    }
}
