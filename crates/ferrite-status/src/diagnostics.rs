//! Error-callback routing and resource statistics.
//!
//! A process-global error callback, if set, receives `(status, module,
//! message)` triples for every reported failure. Resource statistics track
//! an active count and a peak watermark per primitive type, queryable at
//! any time.

use core::fmt;
use core::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use crate::Status;

/// Signature of the global error callback.
///
/// Invoked from the context of the failure — this may be an ISR on
/// bare-metal backends — so implementations must not block.
pub type ErrorCallback = fn(Status, &str, fmt::Arguments<'_>);

fn null_callback(_status: Status, _module: &str, _message: fmt::Arguments<'_>) {}

static ERROR_CALLBACK: AtomicPtr<()> = AtomicPtr::new(null_callback as *mut ());

/// Registers the process-global error callback.
///
/// # Safety
///
/// The callback must be safe to call from any context (including ISR
/// context) and must not block.
pub unsafe fn set_error_callback(callback: ErrorCallback) {
    ERROR_CALLBACK.store(callback as *mut (), Ordering::Release);
}

/// Clears the process-global error callback, reverting to the silent
/// default.
pub fn clear_error_callback() {
    ERROR_CALLBACK.store(null_callback as *mut (), Ordering::Release);
}

#[inline]
fn load_callback() -> ErrorCallback {
    let ptr = ERROR_CALLBACK.load(Ordering::Acquire);
    // SAFETY: only `ErrorCallback`-typed pointers are ever stored.
    unsafe { core::mem::transmute(ptr) }
}

/// Routes a failure to the registered error callback.
///
/// Fatal conditions are reported this way but never halt the process — the
/// caller, having already received the failing [`Status`] as a return
/// value, decides what to do.
pub fn report_error(status: Status, module: &str, message: fmt::Arguments<'_>) {
    load_callback()(status, module, message);
}

/// Active-count / peak-watermark counter for one primitive type.
///
/// Every `*_create` calls [`ResourceStats::record_create`] and every
/// `*_delete` calls [`ResourceStats::record_delete`]; the peak watermark is
/// monotone non-decreasing between explicit resets, matching the memory
/// tracker's watermark contract.
#[derive(Debug, Default)]
pub struct ResourceStats {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ResourceStats {
    /// Creates a new, zeroed counter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Records one successful `create`, advancing the peak if needed.
    pub fn record_create(&self) {
        let active = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(active, Ordering::AcqRel);
    }

    /// Records one successful `delete`.
    pub fn record_delete(&self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }

    /// Returns the current active count.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Returns the peak active count observed since the last reset.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Resets the peak watermark to the current active count.
    pub fn reset_peak(&self) {
        self.peak.store(self.active(), Ordering::Release);
    }
}
