//! Single-slot RTCC interrupt callback.
//!
//! The interrupt vector is fixed by the platform, so the callback has to live
//! somewhere a free function can reach. Declare one [`InterruptSlot`] as a
//! `static`, hand it to the driver, and call [`InterruptSlot::on_interrupt`]
//! from the RTCC vector:
//!
//! ```rust,ignore
//! static RTCC_IRQ: InterruptSlot = InterruptSlot::new();
//!
//! #[interrupt]
//! fn RTCC() {
//!     RTCC_IRQ.on_interrupt(|| unsafe { clear_rtcc_flag() });
//! }
//! ```
//!
//! The callback runs in interrupt context. It must not call back into the
//! driver; set a flag or queue work instead.

use core::cell::Cell;

use critical_section::Mutex;

/// Holds at most one niladic interrupt callback.
pub struct InterruptSlot {
    handler: Mutex<Cell<Option<fn()>>>,
}

impl InterruptSlot {
    pub const fn new() -> Self {
        Self {
            handler: Mutex::new(Cell::new(None)),
        }
    }

    /// Stores `handler`, replacing any previous one.
    pub fn attach(&self, handler: fn()) {
        critical_section::with(|cs| self.handler.borrow(cs).set(Some(handler)));
    }

    /// Removes the stored callback and returns it.
    pub fn detach(&self) -> Option<fn()> {
        critical_section::with(|cs| self.handler.borrow(cs).take())
    }

    pub fn is_attached(&self) -> bool {
        critical_section::with(|cs| self.handler.borrow(cs).get().is_some())
    }

    /// Dispatches one interrupt event.
    ///
    /// Calls the stored callback, if any, outside the critical section, then
    /// calls `clear_pending` to acknowledge the source. The flag is cleared
    /// whether or not a callback is attached.
    ///
    /// # Returns
    /// * `true` if a callback ran
    pub fn on_interrupt(&self, clear_pending: impl FnOnce()) -> bool {
        let handler = critical_section::with(|cs| self.handler.borrow(cs).get());
        if let Some(handler) = handler {
            handler();
        }
        clear_pending();
        handler.is_some()
    }
}

impl Default for InterruptSlot {
    fn default() -> Self {
        Self::new()
    }
}
