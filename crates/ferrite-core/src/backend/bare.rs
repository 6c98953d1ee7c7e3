//! Bare-metal backend contract: a single-core, cooperative reference
//! implementation driven by a caller-supplied tick source.
//!
//! Concrete RTOS/register-level platform adapters are out of scope; this
//! module ships only the adapter contract plus a spin-loop reference good
//! enough for a single-threaded deployment. A real adapter replaces
//! [`advance_ticks`]'s caller (typically a timer ISR) with its own tick
//! source and otherwise reuses this module as-is.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

static TICKS_MS: AtomicU64 = AtomicU64::new(0);

/// Identity of the currently running context.
///
/// The bare backend is single-core and cooperative (scheduling policy is
/// out of scope here), so there is exactly one running context at a time.
/// Whatever minimal context-switch code a concrete
/// platform adapter supplies is expected to call [`set_current_context`]
/// when it switches; until then every caller shares context `0`.
pub type ThreadId = u32;

static CURRENT_CONTEXT: AtomicU32 = AtomicU32::new(0);

/// Returns the identity of the currently running context.
#[must_use]
pub fn current_thread_id() -> ThreadId {
    CURRENT_CONTEXT.load(Ordering::Acquire)
}

/// Records which context is now running. Called by the platform adapter's
/// context-switch path, not by this crate.
pub fn set_current_context(id: ThreadId) {
    CURRENT_CONTEXT.store(id, Ordering::Release);
}

/// Monotonic clock driven by [`advance_ticks`].
pub struct Clock;

impl Clock {
    /// Returns the current tick count in milliseconds.
    #[must_use]
    pub fn now_ms() -> u64 {
        TICKS_MS.load(Ordering::Acquire)
    }
}

/// Advances the bare-metal clock by `ms` milliseconds.
///
/// Call this from the platform's periodic timer interrupt. Not invoked by
/// any code in this crate — it is the adapter's responsibility; a register-
/// level platform implementation consumes this contract but contributes no
/// new design of its own.
pub fn advance_ticks(ms: u64) {
    TICKS_MS.fetch_add(ms, Ordering::AcqRel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_ticks_advances_clock() {
        let before = Clock::now_ms();
        advance_ticks(10);
        assert_eq!(Clock::now_ms(), before + 10);
    }
}
