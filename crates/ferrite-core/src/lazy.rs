//! Lazy initialization primitive usable with or without `std`.
//!
//! A `no_std` equivalent of `std::sync::LazyLock` that initializes a value
//! on first access using a spin-based atomic state machine. Every
//! process-global singleton in this crate (pools, resource managers) is a
//! `static` of this type rather than a free-floating mutable, per the
//! "explicit init lifecycle" design note.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ops::Deref;
use core::sync::atomic::{AtomicU8, Ordering};

const UNINIT: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const POISONED: u8 = 3;

/// A value that is initialized on first access.
///
/// Thread-safe via an atomic state machine: if multiple threads race to
/// initialize, one wins and the others spin until the value is ready.
///
/// # Panic safety
///
/// If the init closure panics, the state transitions to `POISONED` and
/// subsequent accesses panic immediately, so waiters never spin forever.
pub struct Lazy<T, F = fn() -> T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
    init: UnsafeCell<Option<F>>,
}

// SAFETY: the atomic state machine ensures the value is fully initialized
// before any thread can read it, and the init closure is consumed once.
unsafe impl<T: Send + Sync, F: Send> Send for Lazy<T, F> {}
unsafe impl<T: Send + Sync, F: Send> Sync for Lazy<T, F> {}

struct InitGuard<'a> {
    state: &'a AtomicU8,
}

impl<'a> InitGuard<'a> {
    fn new(state: &'a AtomicU8) -> Self {
        Self { state }
    }

    fn defuse(self) {
        core::mem::forget(self);
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        self.state.store(POISONED, Ordering::Release);
    }
}

impl<T, F: FnOnce() -> T> Lazy<T, F> {
    /// Creates a new `Lazy` with the given initializer.
    pub const fn new(init: F) -> Self {
        Self {
            state: AtomicU8::new(UNINIT),
            value: UnsafeCell::new(MaybeUninit::uninit()),
            init: UnsafeCell::new(Some(init)),
        }
    }

    /// Forces initialization if not already done, then returns a reference.
    fn force(&self) -> &T {
        match self.state.load(Ordering::Acquire) {
            READY => {
                // SAFETY: state is READY, so the value is fully initialized.
                return unsafe { (*self.value.get()).assume_init_ref() };
            }
            POISONED => panic!("Lazy poisoned: init closure panicked"),
            UNINIT => {
                if self
                    .state
                    .compare_exchange(UNINIT, INITIALIZING, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
                {
                    let guard = InitGuard::new(&self.state);
                    // SAFETY: we are the only thread in the INITIALIZING state.
                    let init = unsafe { (*self.init.get()).take().unwrap() };
                    let value = init();
                    unsafe {
                        (*self.value.get()).write(value);
                    }
                    self.state.store(READY, Ordering::Release);
                    guard.defuse();
                    // SAFETY: we just wrote the value.
                    return unsafe { (*self.value.get()).assume_init_ref() };
                }
            }
            _ => {}
        }

        loop {
            match self.state.load(Ordering::Acquire) {
                READY => break,
                POISONED => panic!("Lazy poisoned: init closure panicked"),
                _ => core::hint::spin_loop(),
            }
        }
        // SAFETY: state is READY.
        unsafe { (*self.value.get()).assume_init_ref() }
    }
}

impl<T, F: FnOnce() -> T> Deref for Lazy<T, F> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.force()
    }
}
