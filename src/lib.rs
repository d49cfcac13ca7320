//! # PIC32 RTCC Driver
//!
//! A platform-agnostic driver for the real-time clock and calendar (RTCC)
//! peripheral found on PIC32 microcontrollers, built on top of
//! `embedded-hal` traits.
//!
//! ## Features
//!
//! - Read and set the calendar date/time with torn-read protection
//! - Tag the time with a [`Validity`] level recording where it came from
//! - Convert between packed BCD, a compact sortable integer, Unix timestamps
//!   and `chrono::NaiveDateTime`
//! - Alarm and chime control: enable, period mask, repeat count, fire time
//! - Route the seconds clock or the alarm pulse to the RTCC output pin
//! - Drift calibration
//! - Single-slot interrupt callback dispatch
//! - Pluggable sync barrier policies ([`Spin`], [`Bounded`])
//! - Optional async driver (`async` feature)
//! - Optional logging through `log` or `defmt`
//!
//! ## Register access
//!
//! The driver never touches memory itself. It talks to the peripheral through
//! an [`RtccRegisters`] implementation provided by the platform, which maps
//! [`RegAddr`] offsets onto the RTCC base address and knows how to reach
//! SYSKEY, OSCCON and the interrupt controller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pic32_rtcc::{InterruptSlot, Rtcc, TimeValue, Validity};
//!
//! static RTCC_IRQ: InterruptSlot = InterruptSlot::new();
//!
//! let mut rtcc = Rtcc::new(regs, &RTCC_IRQ);
//! rtcc.begin();
//!
//! rtcc.set(TimeValue::from_timestamp(1_710_430_200, Validity::Authoritative))?;
//! let now = rtcc.value()?;
//! ```
//!
//! ## Interrupt context
//!
//! Callbacks attached with [`Rtcc::attach_interrupt`] run in interrupt
//! context. They must not call back into the driver, since every driver
//! operation waits on a sync barrier.

#![no_std]

#[macro_use]
mod fmt;

pub mod interrupt;
pub mod registers;
pub mod sync;
pub mod value;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(test)]
mod mock;

use chrono::NaiveDateTime;

pub use crate::interrupt::InterruptSlot;
pub use crate::registers::{AlarmMask, OutputSelect, RegAddr, Rtcalrm, Rtccon};
use crate::registers::{SYSKEY_RESET, SYSKEY_UNLOCK_1, SYSKEY_UNLOCK_2};
pub use crate::sync::{Barrier, Bounded, Spin, SyncWait};
pub use crate::value::{Field, TimeValue, TimeValueError, Validity};

/// Calibration limits of the 10-bit signed CAL field.
pub const CALIBRATION_MIN: i16 = -512;
pub const CALIBRATION_MAX: i16 = 511;

/// Errors that can occur when using the RTCC driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtccError {
    /// A bounded sync policy gave up waiting for the flag to clear
    SyncTimeout(Barrier),
    /// A date/time conversion failed
    DateTime(TimeValueError),
    /// The alarm mask field holds a reserved value
    InvalidAlarmMask(u8),
}

impl From<TimeValueError> for RtccError {
    fn from(e: TimeValueError) -> Self {
        RtccError::DateTime(e)
    }
}

/// Access to the RTCC register block and the few system registers the
/// driver needs.
pub trait RtccRegisters {
    /// Reads one RTCC word.
    fn read(&mut self, addr: RegAddr) -> u32;
    /// Writes one RTCC word.
    fn write(&mut self, addr: RegAddr, value: u32);
    /// Writes the SYSKEY register.
    fn write_syskey(&mut self, key: u32);
    /// Enables the 32 kHz secondary oscillator (OSCCON SOSCEN).
    fn enable_secondary_oscillator(&mut self);
    /// Enables the RTCC interrupt source.
    fn enable_interrupt(&mut self);
    /// Clears the RTCC interrupt flag.
    fn clear_interrupt(&mut self);
}

/// Settings applied by [`Rtcc::configure`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Signal routed to the output pin, or `None` to disable the pin
    pub output: Option<OutputSelect>,
    /// Drift calibration, clamped to -512..=511
    pub calibration: i16,
}

pub(crate) fn sync_busy<R: RtccRegisters>(regs: &mut R, barrier: Barrier) -> bool {
    match barrier {
        Barrier::Time => Rtccon::from(regs.read(RegAddr::Rtccon)).sync(),
        Barrier::Alarm => Rtcalrm::from(regs.read(RegAddr::Rtcalrm)).alarm_sync(),
    }
}

pub(crate) fn unlock<R: RtccRegisters>(regs: &mut R) {
    regs.write_syskey(SYSKEY_RESET);
    regs.write_syskey(SYSKEY_UNLOCK_1);
    regs.write_syskey(SYSKEY_UNLOCK_2);
}

pub(crate) fn lock<R: RtccRegisters>(regs: &mut R) {
    regs.write_syskey(SYSKEY_RESET);
}

/// Powers up the peripheral: interrupt source, write enable, clock, oscillator.
pub(crate) fn power_up<R: RtccRegisters>(regs: &mut R) {
    regs.clear_interrupt();
    regs.enable_interrupt();
    unlock(regs);
    let mut con = Rtccon::from(regs.read(RegAddr::Rtccon));
    con.set_write_enable(true);
    con.set_on(true);
    debug!("RTCC: begin, control {:?}", con);
    regs.write(RegAddr::Rtccon, con.into());
    regs.enable_secondary_oscillator();
    lock(regs);
}

/// Reads date and time until two consecutive pairs agree.
///
/// The counters can roll over between the two reads, so a single pair may
/// mix the old date with the new time.
pub(crate) fn read_stable<R: RtccRegisters>(regs: &mut R) -> (u32, u32) {
    let mut date = regs.read(RegAddr::Rtcdate);
    let mut time = regs.read(RegAddr::Rtctime);
    loop {
        let next_date = regs.read(RegAddr::Rtcdate);
        let next_time = regs.read(RegAddr::Rtctime);
        if next_date == date && next_time == time {
            return (date, time);
        }
        trace!(
            "RTCC: torn read {:#x}/{:#x}, retrying",
            next_date,
            next_time
        );
        date = next_date;
        time = next_time;
    }
}

pub(crate) fn clamp_calibration(calibration: i16) -> i16 {
    calibration.clamp(CALIBRATION_MIN, CALIBRATION_MAX)
}

pub(crate) fn apply_config(con: &mut Rtccon, config: &Config) {
    match config.output {
        Some(select) => {
            con.set_output_select(select);
            con.set_output_enable(true);
        }
        None => con.set_output_enable(false),
    }
    con.set_calibration(clamp_calibration(config.calibration));
}

/// PIC32 RTCC driver.
///
/// Owns the register interface and the sync policy. The only state outside
/// the driver is the [`InterruptSlot`] the interrupt vector dispatches through.
pub struct Rtcc<R: RtccRegisters, W: SyncWait = Spin> {
    regs: R,
    wait: W,
    interrupt: &'static InterruptSlot,
    validity: Validity,
}

impl<R: RtccRegisters> Rtcc<R, Spin> {
    /// Creates a driver that spins on the sync barriers.
    ///
    /// # Arguments
    /// * `regs` - The register interface
    /// * `interrupt` - The slot the RTCC interrupt vector dispatches through
    pub fn new(regs: R, interrupt: &'static InterruptSlot) -> Self {
        Self::with_sync(regs, Spin::new(), interrupt)
    }
}

impl<R: RtccRegisters, W: SyncWait> Rtcc<R, W> {
    /// Creates a driver with an explicit sync policy.
    ///
    /// # Arguments
    /// * `regs` - The register interface
    /// * `wait` - How to wait out RTCSYNC/ALRMSYNC
    /// * `interrupt` - The slot the RTCC interrupt vector dispatches through
    pub fn with_sync(regs: R, wait: W, interrupt: &'static InterruptSlot) -> Self {
        Self {
            regs,
            wait,
            interrupt,
            validity: Validity::Unset,
        }
    }

    /// Returns the register interface.
    pub fn release(self) -> R {
        self.regs
    }

    /// Starts the peripheral.
    ///
    /// Clears and enables the RTCC interrupt, then under the system unlock
    /// sequence sets RTCWREN and ON and enables the secondary oscillator.
    /// The validity tag is reset to [`Validity::Unset`]. Call once.
    pub fn begin(&mut self) {
        power_up(&mut self.regs);
        self.validity = Validity::Unset;
    }

    /// Configures the output pin and calibration in one control word update.
    ///
    /// # Arguments
    /// * `config` - The configuration to apply
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(RtccError)` if the sync barrier timed out
    pub fn configure(&mut self, config: &Config) -> Result<(), RtccError> {
        self.modify_rtccon(|con| apply_config(con, config))
    }

    /// Reads the current date and time.
    ///
    /// The returned value carries the driver's validity tag.
    pub fn value(&mut self) -> Result<TimeValue, RtccError> {
        self.time_sync()?;
        let (date, time) = read_stable(&mut self.regs);
        Ok(TimeValue::new(date, time, self.validity))
    }

    /// Sets the date and time, and adopts the value's validity tag.
    pub fn set(&mut self, value: TimeValue) -> Result<(), RtccError> {
        self.time_sync()?;
        debug!("RTCC: setting time {}", value);
        self.regs.write(RegAddr::Rtcdate, value.packed_date());
        self.regs.write(RegAddr::Rtctime, value.packed_time());
        self.validity = value.validity();
        Ok(())
    }

    /// Reads the current date and time as a `NaiveDateTime`.
    ///
    /// # Returns
    /// * `Ok(NaiveDateTime)` on success
    /// * `Err(RtccError::DateTime)` if the registers do not hold a real date
    pub fn datetime(&mut self) -> Result<NaiveDateTime, RtccError> {
        let value = self.value()?;
        Ok(NaiveDateTime::try_from(value)?)
    }

    /// Sets the date and time from a `NaiveDateTime`.
    ///
    /// # Arguments
    /// * `datetime` - The date and time, within 2000-2099
    /// * `validity` - Where the time came from
    pub fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
        validity: Validity,
    ) -> Result<(), RtccError> {
        let mut value = TimeValue::try_from(datetime)?;
        value.set_validity(validity);
        self.set(value)
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Overrides the validity tag without touching the clock.
    pub fn set_validity(&mut self, validity: Validity) {
        self.validity = validity;
    }

    /// Routes the seconds clock to the RTCC pin.
    pub fn enable_output(&mut self) -> Result<(), RtccError> {
        self.enable_output_with(OutputSelect::Seconds)
    }

    /// Routes `select` to the RTCC pin and enables it.
    pub fn enable_output_with(&mut self, select: OutputSelect) -> Result<(), RtccError> {
        self.modify_rtccon(|con| {
            con.set_output_select(select);
            con.set_output_enable(true);
        })
    }

    pub fn disable_output(&mut self) -> Result<(), RtccError> {
        self.modify_rtccon(|con| con.set_output_enable(false))
    }

    /// Writes the drift calibration, clamped to -512..=511.
    pub fn calibrate(&mut self, calibration: i16) -> Result<(), RtccError> {
        let calibration = clamp_calibration(calibration);
        self.modify_rtccon(|con| con.set_calibration(calibration))
    }

    pub fn enable_alarm(&mut self) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_alarm_enable(true))
    }

    pub fn disable_alarm(&mut self) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_alarm_enable(false))
    }

    /// Makes the alarm re-arm after every match instead of firing once.
    pub fn enable_chime(&mut self) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_chime(true))
    }

    pub fn disable_chime(&mut self) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_chime(false))
    }

    /// Sets the alarm/chime period.
    pub fn set_alarm_mask(&mut self, mask: AlarmMask) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_mask(mask.into()))
    }

    /// Reads the alarm/chime period.
    ///
    /// # Returns
    /// * `Ok(AlarmMask)` on success
    /// * `Err(RtccError::InvalidAlarmMask)` if the field holds a reserved value
    pub fn alarm_mask(&mut self) -> Result<AlarmMask, RtccError> {
        AlarmMask::try_from(self.rtcalrm()?.mask())
    }

    /// Sets the alarm repeat counter.
    pub fn set_alarm_repeat(&mut self, repeat: u8) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_repeat(repeat))
    }

    pub fn alarm_repeat(&mut self) -> Result<u8, RtccError> {
        Ok(self.rtcalrm()?.repeat())
    }

    pub fn is_alarm_enabled(&mut self) -> Result<bool, RtccError> {
        Ok(self.rtcalrm()?.alarm_enable())
    }

    pub fn is_chime_enabled(&mut self) -> Result<bool, RtccError> {
        Ok(self.rtcalrm()?.chime())
    }

    /// Sets the alarm fire time, which is also the phase anchor of a chime.
    pub fn set_alarm_value(&mut self, value: TimeValue) -> Result<(), RtccError> {
        self.alarm_sync()?;
        debug!("RTCC: setting alarm {}", value);
        self.regs.write(RegAddr::Alrmdate, value.packed_date());
        self.regs.write(RegAddr::Alrmtime, value.packed_time());
        Ok(())
    }

    /// Reads the alarm fire time. The result is always tagged [`Validity::Unset`].
    pub fn alarm_value(&mut self) -> Result<TimeValue, RtccError> {
        self.alarm_sync()?;
        let date = self.regs.read(RegAddr::Alrmdate);
        let time = self.regs.read(RegAddr::Alrmtime);
        Ok(TimeValue::new(date, time, Validity::Unset))
    }

    /// Stores the interrupt callback, replacing any previous one.
    ///
    /// The callback runs in interrupt context and must not call back into the
    /// driver.
    pub fn attach_interrupt(&mut self, handler: fn()) {
        self.interrupt.attach(handler);
    }

    /// Dispatches one RTCC interrupt and clears the flag.
    ///
    /// # Returns
    /// * `true` if a callback ran
    pub fn handle_interrupt(&mut self) -> bool {
        let regs = &mut self.regs;
        self.interrupt.on_interrupt(|| regs.clear_interrupt())
    }

    fn time_sync(&mut self) -> Result<(), RtccError> {
        let regs = &mut self.regs;
        self.wait
            .wait_while(Barrier::Time, || sync_busy(regs, Barrier::Time))
    }

    fn alarm_sync(&mut self) -> Result<(), RtccError> {
        let regs = &mut self.regs;
        self.wait
            .wait_while(Barrier::Alarm, || sync_busy(regs, Barrier::Alarm))
    }

    // Control word writes need the unlock sequence around them
    fn modify_rtccon<F: FnOnce(&mut Rtccon)>(&mut self, f: F) -> Result<(), RtccError> {
        self.time_sync()?;
        unlock(&mut self.regs);
        let mut con = Rtccon::from(self.regs.read(RegAddr::Rtccon));
        f(&mut con);
        debug!("RTCC: writing control {:?}", con);
        self.regs.write(RegAddr::Rtccon, con.into());
        lock(&mut self.regs);
        Ok(())
    }

    fn rtcalrm(&mut self) -> Result<Rtcalrm, RtccError> {
        self.alarm_sync()?;
        Ok(Rtcalrm::from(self.regs.read(RegAddr::Rtcalrm)))
    }

    fn modify_rtcalrm<F: FnOnce(&mut Rtcalrm)>(&mut self, f: F) -> Result<(), RtccError> {
        let mut alrm = self.rtcalrm()?;
        f(&mut alrm);
        debug!("RTCC: writing alarm control {:?}", alrm);
        self.regs.write(RegAddr::Rtcalrm, alrm.into());
        Ok(())
    }
}
