//! Register definitions and bitfield structures for the PIC32 RTCC.
//!
//! The RTCC exposes six 32-bit words. Two of them are control words
//! ([`Rtccon`] and [`Rtcalrm`]); the other four hold the live and alarm
//! date/time as packed BCD ([`PackedDate`] and [`PackedTime`]).

use bitfield::bitfield;

/// Register offsets of the RTCC block, relative to its base address.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Control register (enable, write enable, sync, output, calibration)
    Rtccon = 0x00,
    /// Alarm control register (enable, chime, mask, repeat)
    Rtcalrm = 0x10,
    /// Live time: hours, minutes, seconds
    Rtctime = 0x20,
    /// Live date: year, month, day, weekday
    Rtcdate = 0x30,
    /// Alarm time
    Alrmtime = 0x40,
    /// Alarm date
    Alrmdate = 0x50,
}

/// First word of the system unlock sequence.
pub const SYSKEY_RESET: u32 = 0x0000_0000;
/// Second word of the system unlock sequence.
pub const SYSKEY_UNLOCK_1: u32 = 0xAA99_6655;
/// Third word of the system unlock sequence.
pub const SYSKEY_UNLOCK_2: u32 = 0x5566_99AA;

/// Signal routed to the RTCC output pin when output is enabled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputSelect {
    /// One pulse per alarm event
    AlarmPulse = 0,
    /// The seconds clock
    Seconds = 1,
}
impl From<u32> for OutputSelect {
    /// Creates an `OutputSelect` from the raw RTSECSEL bit.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u32) -> Self {
        match v {
            0 => OutputSelect::AlarmPulse,
            1 => OutputSelect::Seconds,
            _ => panic!("Invalid value for OutputSelect: {}", v),
        }
    }
}
impl From<OutputSelect> for u32 {
    fn from(v: OutputSelect) -> Self {
        v as u32
    }
}

/// Alarm and chime repeat period, written to the AMASK field.
///
/// The period also decides which fields of the alarm value are compared: an
/// hourly alarm only looks at minutes and seconds, so setting both to zero
/// anchors a chime to the top of every hour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmMask {
    /// Every half second
    HalfSecond = 0x0,
    /// Every second
    Second = 0x1,
    /// Every ten seconds
    TenSeconds = 0x2,
    /// Every minute
    Minute = 0x3,
    /// Every ten minutes
    TenMinutes = 0x4,
    /// Every hour
    Hour = 0x5,
    /// Once a day
    Day = 0x6,
    /// Once a week
    Week = 0x7,
    /// Once a month
    Month = 0x8,
    /// Once a year
    Year = 0x9,
}

impl TryFrom<u8> for AlarmMask {
    type Error = crate::RtccError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Ok(match v {
            0x0 => AlarmMask::HalfSecond,
            0x1 => AlarmMask::Second,
            0x2 => AlarmMask::TenSeconds,
            0x3 => AlarmMask::Minute,
            0x4 => AlarmMask::TenMinutes,
            0x5 => AlarmMask::Hour,
            0x6 => AlarmMask::Day,
            0x7 => AlarmMask::Week,
            0x8 => AlarmMask::Month,
            0x9 => AlarmMask::Year,
            _ => return Err(crate::RtccError::InvalidAlarmMask(v)),
        })
    }
}
impl From<AlarmMask> for u8 {
    fn from(v: AlarmMask) -> Self {
        v as u8
    }
}

// This macro generates the From<u32> and Into<u32> implementations for the
// register type
macro_rules! from_register_u32 {
    ($typ:ty) => {
        impl From<u32> for $typ {
            fn from(v: u32) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u32 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// RTCCON: peripheral control.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Rtccon(u32);
    impl Debug;
    /// Drift calibration, signed, added once per minute
    pub i16, calibration, set_calibration: 25, 16;
    /// Peripheral enable
    pub on, set_on: 15;
    /// Freeze in debug mode
    pub freeze, set_freeze: 14;
    /// Stop in idle mode
    pub stop_in_idle, set_stop_in_idle: 13;
    /// Output pin source
    pub from into OutputSelect, output_select, set_output_select: 7, 7;
    /// Clock running status
    pub clock_on, _: 6;
    /// Time/date write enable (only changes while unlocked)
    pub write_enable, set_write_enable: 3;
    /// Time/date registers are being updated; do not access
    pub sync, set_sync: 2;
    /// Half-second status
    pub half_second, _: 1;
    /// Output pin enable
    pub output_enable, set_output_enable: 0;
}
from_register_u32!(Rtccon);

#[cfg(feature = "defmt")]
impl defmt::Format for Rtccon {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Rtccon(");
        if self.on() {
            defmt::write!(f, "ON");
        } else {
            defmt::write!(f, "off");
        }
        if self.write_enable() {
            defmt::write!(f, ", WREN");
        }
        if self.sync() {
            defmt::write!(f, ", SYNC");
        }
        if self.output_enable() {
            defmt::write!(f, ", OE {}", self.output_select());
        }
        defmt::write!(f, ", cal {})", self.calibration());
    }
}

bitfield! {
    /// RTCALRM: alarm and chime control.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Rtcalrm(u32);
    impl Debug;
    /// Alarm enable
    pub alarm_enable, set_alarm_enable: 15;
    /// Chime: re-arm after every match instead of firing once
    pub chime, set_chime: 14;
    /// Alarm pulse initial value
    pub pulse_initial, set_pulse_initial: 13;
    /// Alarm registers are being updated; do not access
    pub alarm_sync, set_alarm_sync: 12;
    /// Raw repeat period, see [`AlarmMask`]
    pub u8, mask, set_mask: 11, 8;
    /// Remaining repeat count
    pub u8, repeat, set_repeat: 7, 0;
}
from_register_u32!(Rtcalrm);

#[cfg(feature = "defmt")]
impl defmt::Format for Rtcalrm {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Rtcalrm(enable {}, chime {}, mask {}, repeat {})",
            self.alarm_enable(),
            self.chime(),
            self.mask(),
            self.repeat()
        );
    }
}

bitfield! {
    /// Packed BCD date word: year, month, day of month, day of week.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct PackedDate(u32);
    impl Debug;
    /// Year within the century (00-99)
    pub u8, year, set_year: 31, 24;
    /// Month (01-12)
    pub u8, month, set_month: 23, 16;
    /// Day of month (01-31)
    pub u8, day, set_day: 15, 8;
    /// Day of week, stored as given
    pub u8, weekday, set_weekday: 7, 0;
}
from_register_u32!(PackedDate);

bitfield! {
    /// Packed BCD time word: hours, minutes, seconds, reserved low byte.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct PackedTime(u32);
    impl Debug;
    /// Hours (00-23)
    pub u8, hours, set_hours: 31, 24;
    /// Minutes (00-59)
    pub u8, minutes, set_minutes: 23, 16;
    /// Seconds (00-59)
    pub u8, seconds, set_seconds: 15, 8;
    /// Reserved, preserved on writes
    pub u8, reserved, set_reserved: 7, 0;
}
from_register_u32!(PackedTime);
