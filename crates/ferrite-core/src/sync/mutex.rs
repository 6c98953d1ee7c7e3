//! Recursive mutex.
//!
//! Ownership is tracked by calling-thread identity rather than by any OSAL
//! task handle, so a raw host thread that never went through
//! [`crate::task`] can still take and recursively re-take a mutex.

use ferrite_status::Status;

use crate::backend::{self, ThreadId};
use crate::timeout::Timeout;

#[cfg(feature = "std")]
use std::sync::{Condvar, Mutex as StdMutex};

#[cfg(not(feature = "std"))]
use crate::spinlock::SpinLock;

struct State {
    owner: Option<ThreadId>,
    depth: u32,
}

impl State {
    const fn new() -> Self {
        Self {
            owner: None,
            depth: 0,
        }
    }
}

#[cfg(feature = "std")]
struct Inner {
    state: StdMutex<State>,
    cond: Condvar,
}

#[cfg(not(feature = "std"))]
struct Inner {
    state: SpinLock<State>,
}

/// A recursive mutual-exclusion lock.
///
/// The owning thread may lock it any number of times; it becomes available
/// to other threads only once `unlock` has been called a matching number of
/// times.
pub struct Mutex {
    inner: Inner,
}

impl Mutex {
    /// Creates a new, unlocked mutex.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(feature = "std")]
        {
            Self {
                inner: Inner {
                    state: StdMutex::new(State::new()),
                    cond: Condvar::new(),
                },
            }
        }
        #[cfg(not(feature = "std"))]
        {
            Self {
                inner: Inner {
                    state: SpinLock::new(State::new()),
                },
            }
        }
    }

    /// Acquires the mutex, recursively if the calling thread already owns
    /// it.
    ///
    /// `timeout_ms` follows the shared [`Timeout`] convention: `0` polls
    /// once, `0xFFFF_FFFF` blocks forever, any other value blocks until an
    /// absolute deadline computed once at entry. Returns
    /// [`Status::Timeout`] if the deadline is reached before the mutex
    /// becomes available.
    #[must_use]
    pub fn lock(&self, timeout_ms: u32) -> Status {
        let tid = backend::current_thread_id();
        let timeout = Timeout::classify(timeout_ms, backend::now_ms());

        #[cfg(feature = "std")]
        {
            let mut guard = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if try_claim(&mut guard, tid) {
                    return Status::Ok;
                }
                match timeout {
                    Timeout::Poll => return Status::Timeout,
                    Timeout::Forever => {
                        guard = self
                            .inner
                            .cond
                            .wait(guard)
                            .unwrap_or_else(|e| e.into_inner());
                    }
                    Timeout::Bounded { deadline_ms } => {
                        let now = backend::now_ms();
                        if now >= deadline_ms {
                            return Status::Timeout;
                        }
                        let remaining = std::time::Duration::from_millis(deadline_ms - now);
                        let (next, _) = self
                            .inner
                            .cond
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
                    let mut guard = self.inner.state.lock();
                    if try_claim(&mut guard, tid) {
                        return Status::Ok;
                    }
                }
                if timeout.is_expired(backend::now_ms()) {
                    return Status::Timeout;
                }
                core::hint::spin_loop();
            }
        }
    }

    /// Releases one level of ownership. Must be called once per successful
    /// `lock` by the same thread.
    ///
    /// Returns [`Status::InvalidState`] if the calling thread does not
    /// currently own the mutex.
    #[must_use]
    pub fn unlock(&self) -> Status {
        let tid = backend::current_thread_id();

        #[cfg(feature = "std")]
        {
            let mut guard = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            if guard.owner != Some(tid) {
                return Status::InvalidState;
            }
            guard.depth -= 1;
            if guard.depth == 0 {
                guard.owner = None;
                self.inner.cond.notify_one();
            }
            Status::Ok
        }

        #[cfg(not(feature = "std"))]
        {
            let mut guard = self.inner.state.lock();
            if guard.owner != Some(tid) {
                return Status::InvalidState;
            }
            guard.depth -= 1;
            if guard.depth == 0 {
                guard.owner = None;
            }
            Status::Ok
        }
    }

    /// Returns `true` if the mutex is currently held by any thread.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        #[cfg(feature = "std")]
        {
            self.inner
                .state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .owner
                .is_some()
        }
        #[cfg(not(feature = "std"))]
        {
            self.inner.state.lock().owner.is_some()
        }
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

fn try_claim(state: &mut State, tid: ThreadId) -> bool {
    match state.owner {
        None => {
            state.owner = Some(tid);
            state.depth = 1;
            true
        }
        Some(owner) if owner == tid => {
            state.depth += 1;
            true
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeout::WAIT_FOREVER;

    #[test]
    fn lock_unlock_round_trip() {
        let m = Mutex::new();
        assert_eq!(m.lock(WAIT_FOREVER), Status::Ok);
        assert!(m.is_locked());
        assert_eq!(m.unlock(), Status::Ok);
        assert!(!m.is_locked());
    }

    #[test]
    fn recursive_lock_requires_matching_unlocks() {
        let m = Mutex::new();
        assert_eq!(m.lock(WAIT_FOREVER), Status::Ok);
        assert_eq!(m.lock(WAIT_FOREVER), Status::Ok);
        assert_eq!(m.unlock(), Status::Ok);
        assert!(m.is_locked());
        assert_eq!(m.unlock(), Status::Ok);
        assert!(!m.is_locked());
    }

    #[test]
    fn unlock_by_non_owner_is_invalid_state() {
        let m = Mutex::new();
        assert_eq!(m.unlock(), Status::InvalidState);
    }

    #[test]
    fn poll_on_contended_mutex_times_out() {
        let m = std::sync::Arc::new(Mutex::new());
        assert_eq!(m.lock(WAIT_FOREVER), Status::Ok);
        let other = std::thread::spawn({
            let m = m.clone();
            move || m.lock(0)
        })
        .join()
        .unwrap();
        assert_eq!(other, Status::Timeout);
    }

    #[test]
    fn bounded_wait_succeeds_once_released() {
        let m = std::sync::Arc::new(Mutex::new());
        assert_eq!(m.lock(WAIT_FOREVER), Status::Ok);
        let waiter = std::thread::spawn({
            let m = m.clone();
            move || m.lock(500)
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(m.unlock(), Status::Ok);
        assert_eq!(waiter.join().unwrap(), Status::Ok);
    }
}
