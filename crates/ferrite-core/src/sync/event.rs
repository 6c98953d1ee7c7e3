//! Event flags: a 24-bit shared bitmask with any/all wait semantics.

use ferrite_status::Status;

use crate::backend;
use crate::timeout::Timeout;

#[cfg(feature = "std")]
use std::sync::{Condvar, Mutex as StdMutex};

#[cfg(not(feature = "std"))]
use crate::spinlock::SpinLock;

/// Only the low 24 bits of an event group are significant; bits above 23
/// are silently masked off on every operation.
pub const EVENT_BITS_MASK: u32 = 0x00FF_FFFF;

/// Wait mode for [`EventGroup::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Satisfied once any bit in the requested mask is set.
    Any,
    /// Satisfied only once every bit in the requested mask is set.
    All,
}

#[cfg(feature = "std")]
struct Inner {
    bits: StdMutex<u32>,
    changed: Condvar,
}

#[cfg(not(feature = "std"))]
struct Inner {
    bits: SpinLock<u32>,
}

/// A group of 24 independently settable/clearable event bits.
pub struct EventGroup {
    inner: Inner,
}

fn satisfied(current: u32, mask: u32, mode: WaitMode) -> bool {
    match mode {
        WaitMode::Any => current & mask != 0,
        WaitMode::All => current & mask == mask,
    }
}

impl EventGroup {
    /// Creates an event group with every bit clear.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(feature = "std")]
        {
            Self {
                inner: Inner {
                    bits: StdMutex::new(0),
                    changed: Condvar::new(),
                },
            }
        }
        #[cfg(not(feature = "std"))]
        {
            Self {
                inner: Inner {
                    bits: SpinLock::new(0),
                },
            }
        }
    }

    /// Sets the bits in `mask`, waking every waiter whose condition is now
    /// satisfied. Bits above bit 23 are silently masked off.
    pub fn set(&self, mask: u32) {
        let mask = mask & EVENT_BITS_MASK;
        #[cfg(feature = "std")]
        {
            let mut bits = self.inner.bits.lock().unwrap_or_else(|e| e.into_inner());
            *bits |= mask;
            drop(bits);
            self.inner.changed.notify_all();
        }
        #[cfg(not(feature = "std"))]
        {
            let mut bits = self.inner.bits.lock();
            *bits |= mask;
        }
    }

    /// Clears the bits in `mask`. Bits above bit 23 are silently masked off.
    pub fn clear(&self, mask: u32) {
        let mask = mask & EVENT_BITS_MASK;
        #[cfg(feature = "std")]
        {
            *self.inner.bits.lock().unwrap_or_else(|e| e.into_inner()) &= !mask;
        }
        #[cfg(not(feature = "std"))]
        {
            *self.inner.bits.lock() &= !mask;
        }
    }

    /// Returns the currently set bits.
    #[must_use]
    pub fn get(&self) -> u32 {
        #[cfg(feature = "std")]
        {
            *self.inner.bits.lock().unwrap_or_else(|e| e.into_inner())
        }
        #[cfg(not(feature = "std"))]
        {
            *self.inner.bits.lock()
        }
    }

    /// Waits for `mask` to become satisfied under `mode`, blocking per
    /// `timeout_ms`'s [`Timeout`] convention.
    ///
    /// If `auto_clear` is set and the wait is satisfied, the bits in `mask`
    /// are cleared atomically with the wait's success before returning.
    /// Returns the bits observed at the moment the wait was satisfied (or,
    /// on timeout, the bits observed at that point).
    #[must_use]
    pub fn wait(&self, mask: u32, mode: WaitMode, auto_clear: bool, timeout_ms: u32) -> (Status, u32) {
        let mask = mask & EVENT_BITS_MASK;
        let timeout = Timeout::classify(timeout_ms, backend::now_ms());

        #[cfg(feature = "std")]
        {
            let mut guard = self.inner.bits.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if satisfied(*guard, mask, mode) {
                    let observed = *guard & mask;
                    if auto_clear {
                        *guard &= !mask;
                    }
                    return (Status::Ok, observed);
                }
                match timeout {
                    Timeout::Poll => return (Status::Timeout, *guard),
                    Timeout::Forever => {
                        guard = self
                            .inner
                            .changed
                            .wait(guard)
                            .unwrap_or_else(|e| e.into_inner());
                    }
                    Timeout::Bounded { deadline_ms } => {
                        let now = backend::now_ms();
                        if now >= deadline_ms {
                            return (Status::Timeout, *guard);
                        }
                        let remaining = std::time::Duration::from_millis(deadline_ms - now);
                        let (next, _) = self
                            .inner
                            .changed
                            .wait_timeout(guard, remaining)
                            .unwrap_or_else(|e| e.into_inner());
                        guard = next;
                    }
                }
            }
        }

        #[cfg(not(feature = "std"))]
        {
            loop {
                {
                    let mut guard = self.inner.bits.lock();
                    if satisfied(*guard, mask, mode) {
                        let observed = *guard & mask;
                        if auto_clear {
                            *guard &= !mask;
                        }
                        return (Status::Ok, observed);
                    }
                }
                match timeout {
                    Timeout::Poll => return (Status::Timeout, self.get()),
                    _ if timeout.is_expired(backend::now_ms()) => return (Status::Timeout, self.get()),
                    _ => core::hint::spin_loop(),
                }
            }
        }
    }
}

impl Default for EventGroup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeout::WAIT_FOREVER;

    #[test]
    fn set_and_get_round_trip() {
        let e = EventGroup::new();
        e.set(0b101);
        assert_eq!(e.get(), 0b101);
    }

    #[test]
    fn bits_above_23_are_masked() {
        let e = EventGroup::new();
        e.set(0xFFFF_FFFF);
        assert_eq!(e.get(), EVENT_BITS_MASK);
    }

    #[test]
    fn wait_any_satisfied_by_single_bit() {
        let e = EventGroup::new();
        e.set(0b010);
        let (status, bits) = e.wait(0b110, WaitMode::Any, false, 0);
        assert_eq!(status, Status::Ok);
        assert_eq!(bits, 0b010);
    }

    #[test]
    fn wait_all_requires_every_bit() {
        let e = EventGroup::new();
        e.set(0b010);
        assert_eq!(e.wait(0b110, WaitMode::All, false, 0).0, Status::Timeout);
        e.set(0b100);
        assert_eq!(e.wait(0b110, WaitMode::All, false, 0).0, Status::Ok);
    }

    #[test]
    fn auto_clear_clears_matched_bits_only() {
        let e = EventGroup::new();
        e.set(0b111);
        let (status, _) = e.wait(0b011, WaitMode::All, true, 0);
        assert_eq!(status, Status::Ok);
        assert_eq!(e.get(), 0b100);
    }

    #[test]
    fn blocked_waiter_is_woken_by_set() {
        let e = std::sync::Arc::new(EventGroup::new());
        let waiter = std::thread::spawn({
            let e = e.clone();
            move || e.wait(0b1, WaitMode::Any, false, 500)
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        e.set(0b1);
        let (status, bits) = waiter.join().unwrap();
        assert_eq!(status, Status::Ok);
        assert_eq!(bits, 0b1);
    }

    #[test]
    fn wait_returns_only_the_matched_bits_not_the_full_field() {
        let e = EventGroup::new();
        e.set(0b101);
        let (status, matched) = e.wait(0b100, WaitMode::All, true, 0);
        assert_eq!(status, Status::Ok);
        assert_eq!(matched, 0b100);
        assert_eq!(e.get(), 0b001);
    }

    #[test]
    fn forever_wait_blocks_until_satisfied() {
        let e = std::sync::Arc::new(EventGroup::new());
        let waiter = std::thread::spawn({
            let e = e.clone();
            move || e.wait(0b1, WaitMode::Any, false, WAIT_FOREVER)
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        e.set(0b1);
        assert_eq!(waiter.join().unwrap().0, Status::Ok);
    }
}
