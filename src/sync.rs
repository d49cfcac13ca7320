//! Synchronization barrier policies.
//!
//! The RTCC raises RTCSYNC (and ALRMSYNC for the alarm registers) shortly
//! before it updates its counters. Reading or writing while the flag is set can
//! tear a value, so the driver waits for the flag to clear before each access.
//! How it waits is up to the [`SyncWait`] it was built with.

use embedded_hal::delay::DelayNs;

use crate::RtccError;

/// Which hardware sync flag a wait is guarding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Barrier {
    /// RTCSYNC, guarding the live time/date and the control word
    Time,
    /// ALRMSYNC, guarding the alarm control, date and time
    Alarm,
}

/// Strategy for waiting out a sync barrier.
pub trait SyncWait {
    /// Waits until `busy` returns `false`.
    ///
    /// # Arguments
    /// * `barrier` - The flag being polled, for error reporting
    /// * `busy` - Reads the flag; returns `true` while access is unsafe
    ///
    /// # Returns
    /// * `Ok(())` once the flag has cleared
    /// * `Err(RtccError::SyncTimeout)` if the policy gave up
    fn wait_while<F: FnMut() -> bool>(&mut self, barrier: Barrier, busy: F)
        -> Result<(), RtccError>;
}

/// Spins until the flag clears, however long that takes.
///
/// With a dead 32 kHz oscillator the flag never clears and this never
/// returns. An optional hook is called on every busy poll, for example to
/// feed a watchdog or yield to a cooperative scheduler.
#[derive(Copy, Clone, Debug, Default)]
pub struct Spin {
    hook: Option<fn()>,
}

impl Spin {
    pub const fn new() -> Self {
        Self { hook: None }
    }

    /// Spins, calling `hook` on every busy poll.
    pub const fn with_hook(hook: fn()) -> Self {
        Self { hook: Some(hook) }
    }
}

impl SyncWait for Spin {
    fn wait_while<F: FnMut() -> bool>(
        &mut self,
        _barrier: Barrier,
        mut busy: F,
    ) -> Result<(), RtccError> {
        while busy() {
            match self.hook {
                Some(hook) => hook(),
                None => core::hint::spin_loop(),
            }
        }
        Ok(())
    }
}

/// Polls a bounded number of times, sleeping between polls.
///
/// Gives up with [`RtccError::SyncTimeout`] after `max_polls` busy reads.
pub struct Bounded<D: DelayNs> {
    delay: D,
    max_polls: u32,
    interval_us: u32,
}

impl<D: DelayNs> Bounded<D> {
    /// Creates a bounded policy.
    ///
    /// # Arguments
    /// * `delay` - Delay provider used between polls
    /// * `max_polls` - Busy reads allowed before giving up
    /// * `interval_us` - Microseconds to sleep between polls
    pub fn new(delay: D, max_polls: u32, interval_us: u32) -> Self {
        Self {
            delay,
            max_polls,
            interval_us,
        }
    }

    /// Returns the delay provider.
    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> SyncWait for Bounded<D> {
    fn wait_while<F: FnMut() -> bool>(
        &mut self,
        barrier: Barrier,
        mut busy: F,
    ) -> Result<(), RtccError> {
        let mut polls: u32 = 0;
        while busy() {
            polls += 1;
            if polls >= self.max_polls {
                warn!("RTCC: {:?} sync still busy after {} polls", barrier, polls);
                return Err(RtccError::SyncTimeout(barrier));
            }
            self.delay.delay_us(self.interval_us);
        }
        if polls > 0 {
            trace!("RTCC: {:?} sync cleared after {} polls", barrier, polls);
        }
        Ok(())
    }
}
