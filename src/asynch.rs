//! Async implementation of the RTCC driver.
//!
//! This module provides an async interface to the PIC32 RTCC using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled.
//!
//! The register accesses themselves are plain memory operations; what changes
//! is the sync barrier. Instead of spinning, the driver awaits a short delay
//! between polls of RTCSYNC/ALRMSYNC so the executor can run other tasks.
//!
//! # Example
//!
//! ```rust,ignore
//! use pic32_rtcc::asynch::Rtcc;
//!
//! static RTCC_IRQ: InterruptSlot = InterruptSlot::new();
//!
//! // Initialize device, giving up after 50 busy polls
//! let mut rtcc = Rtcc::new(regs, delay, &RTCC_IRQ).with_timeout(50);
//! rtcc.begin();
//!
//! // Get current date/time asynchronously
//! let now = rtcc.value().await?;
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::delay::DelayNs;

use crate::{
    apply_config, clamp_calibration, lock, power_up, read_stable, sync_busy, unlock, AlarmMask,
    Barrier, Config, InterruptSlot, OutputSelect, RegAddr, RtccError, RtccRegisters, Rtcalrm,
    Rtccon, TimeValue, Validity,
};

const DEFAULT_POLL_INTERVAL_US: u32 = 1000;

/// PIC32 RTCC async driver.
pub struct Rtcc<R: RtccRegisters, D: DelayNs> {
    regs: R,
    delay: D,
    interrupt: &'static InterruptSlot,
    validity: Validity,
    poll_interval_us: u32,
    max_polls: Option<u32>,
}

impl<R: RtccRegisters, D: DelayNs> Rtcc<R, D> {
    /// Creates a new async driver that waits on the barriers indefinitely.
    ///
    /// # Arguments
    /// * `regs` - The register interface
    /// * `delay` - The async delay awaited between barrier polls
    /// * `interrupt` - The slot the RTCC interrupt vector dispatches through
    pub fn new(regs: R, delay: D, interrupt: &'static InterruptSlot) -> Self {
        Self {
            regs,
            delay,
            interrupt,
            validity: Validity::Unset,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            max_polls: None,
        }
    }

    /// Gives up with [`RtccError::SyncTimeout`] after `max_polls` busy reads.
    pub fn with_timeout(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    /// Sets the delay between barrier polls.
    pub fn with_poll_interval(mut self, interval_us: u32) -> Self {
        self.poll_interval_us = interval_us;
        self
    }

    /// Returns the register interface and the delay provider.
    pub fn release(self) -> (R, D) {
        (self.regs, self.delay)
    }

    /// Starts the peripheral. See [`crate::Rtcc::begin`].
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
    pub async fn configure(&mut self, config: &Config) -> Result<(), RtccError> {
        self.modify_rtccon(|con| apply_config(con, config)).await
    }

    /// Reads the current date and time, tagged with the driver's validity.
    pub async fn value(&mut self) -> Result<TimeValue, RtccError> {
        self.wait_sync(Barrier::Time).await?;
        let (date, time) = read_stable(&mut self.regs);
        Ok(TimeValue::new(date, time, self.validity))
    }

    /// Sets the date and time, and adopts the value's validity tag.
    pub async fn set(&mut self, value: TimeValue) -> Result<(), RtccError> {
        self.wait_sync(Barrier::Time).await?;
        debug!("RTCC: setting time {}", value);
        self.regs.write(RegAddr::Rtcdate, value.packed_date());
        self.regs.write(RegAddr::Rtctime, value.packed_time());
        self.validity = value.validity();
        Ok(())
    }

    pub async fn datetime(&mut self) -> Result<NaiveDateTime, RtccError> {
        let value = self.value().await?;
        Ok(NaiveDateTime::try_from(value)?)
    }

    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
        validity: Validity,
    ) -> Result<(), RtccError> {
        let mut value = TimeValue::try_from(datetime)?;
        value.set_validity(validity);
        self.set(value).await
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn set_validity(&mut self, validity: Validity) {
        self.validity = validity;
    }

    pub async fn enable_output(&mut self) -> Result<(), RtccError> {
        self.enable_output_with(OutputSelect::Seconds).await
    }

    pub async fn enable_output_with(&mut self, select: OutputSelect) -> Result<(), RtccError> {
        self.modify_rtccon(|con| {
            con.set_output_select(select);
            con.set_output_enable(true);
        })
        .await
    }

    pub async fn disable_output(&mut self) -> Result<(), RtccError> {
        self.modify_rtccon(|con| con.set_output_enable(false)).await
    }

    /// Writes the drift calibration, clamped to -512..=511.
    pub async fn calibrate(&mut self, calibration: i16) -> Result<(), RtccError> {
        let calibration = clamp_calibration(calibration);
        self.modify_rtccon(|con| con.set_calibration(calibration))
            .await
    }

    pub async fn enable_alarm(&mut self) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_alarm_enable(true)).await
    }

    pub async fn disable_alarm(&mut self) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_alarm_enable(false))
            .await
    }

    pub async fn enable_chime(&mut self) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_chime(true)).await
    }

    pub async fn disable_chime(&mut self) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_chime(false)).await
    }

    pub async fn set_alarm_mask(&mut self, mask: AlarmMask) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_mask(mask.into())).await
    }

    pub async fn alarm_mask(&mut self) -> Result<AlarmMask, RtccError> {
        AlarmMask::try_from(self.rtcalrm().await?.mask())
    }

    pub async fn set_alarm_repeat(&mut self, repeat: u8) -> Result<(), RtccError> {
        self.modify_rtcalrm(|alrm| alrm.set_repeat(repeat)).await
    }

    pub async fn alarm_repeat(&mut self) -> Result<u8, RtccError> {
        Ok(self.rtcalrm().await?.repeat())
    }

    pub async fn is_alarm_enabled(&mut self) -> Result<bool, RtccError> {
        Ok(self.rtcalrm().await?.alarm_enable())
    }

    pub async fn is_chime_enabled(&mut self) -> Result<bool, RtccError> {
        Ok(self.rtcalrm().await?.chime())
    }

    pub async fn set_alarm_value(&mut self, value: TimeValue) -> Result<(), RtccError> {
        self.wait_sync(Barrier::Alarm).await?;
        debug!("RTCC: setting alarm {}", value);
        self.regs.write(RegAddr::Alrmdate, value.packed_date());
        self.regs.write(RegAddr::Alrmtime, value.packed_time());
        Ok(())
    }

    pub async fn alarm_value(&mut self) -> Result<TimeValue, RtccError> {
        self.wait_sync(Barrier::Alarm).await?;
        let date = self.regs.read(RegAddr::Alrmdate);
        let time = self.regs.read(RegAddr::Alrmtime);
        Ok(TimeValue::new(date, time, Validity::Unset))
    }

    pub fn attach_interrupt(&mut self, handler: fn()) {
        self.interrupt.attach(handler);
    }

    pub fn handle_interrupt(&mut self) -> bool {
        let regs = &mut self.regs;
        self.interrupt.on_interrupt(|| regs.clear_interrupt())
    }

    async fn wait_sync(&mut self, barrier: Barrier) -> Result<(), RtccError> {
        let mut polls: u32 = 0;
        while sync_busy(&mut self.regs, barrier) {
            polls += 1;
            if let Some(max_polls) = self.max_polls {
                if polls >= max_polls {
                    warn!("RTCC: {:?} sync still busy after {} polls", barrier, polls);
                    return Err(RtccError::SyncTimeout(barrier));
                }
            }
            self.delay.delay_us(self.poll_interval_us).await;
        }
        Ok(())
    }

    async fn modify_rtccon<F: FnOnce(&mut Rtccon)>(&mut self, f: F) -> Result<(), RtccError> {
        self.wait_sync(Barrier::Time).await?;
        unlock(&mut self.regs);
        let mut con = Rtccon::from(self.regs.read(RegAddr::Rtccon));
        f(&mut con);
        debug!("RTCC: writing control {:?}", con);
        self.regs.write(RegAddr::Rtccon, con.into());
        lock(&mut self.regs);
        Ok(())
    }

    async fn rtcalrm(&mut self) -> Result<Rtcalrm, RtccError> {
        self.wait_sync(Barrier::Alarm).await?;
        Ok(Rtcalrm::from(self.regs.read(RegAddr::Rtcalrm)))
    }

    async fn modify_rtcalrm<F: FnOnce(&mut Rtcalrm)>(&mut self, f: F) -> Result<(), RtccError> {
        let mut alrm = self.rtcalrm().await?;
        f(&mut alrm);
        debug!("RTCC: writing alarm control {:?}", alrm);
        self.regs.write(RegAddr::Rtcalrm, alrm.into());
        Ok(())
    }
}
