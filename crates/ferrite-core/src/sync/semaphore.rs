//! Counting semaphore.

use ferrite_status::Status;

use crate::backend;
use crate::timeout::Timeout;

#[cfg(feature = "std")]
use std::sync::{Condvar, Mutex as StdMutex};

#[cfg(not(feature = "std"))]
use crate::spinlock::SpinLock;

struct State {
    count: u32,
    max_count: u32,
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

/// A counting semaphore bounded by `max_count`.
pub struct Semaphore {
    inner: Inner,
}

impl Semaphore {
    /// Creates a semaphore with `initial_count` tokens available, saturating
    /// at `max_count`. A `give` past `max_count` is silently dropped rather
    /// than returned as an error, matching the hosted reference semantics of
    /// most RTOS counting semaphores.
    #[must_use]
    pub fn new(initial_count: u32, max_count: u32) -> Self {
        let initial = initial_count.min(max_count);
        let state = State {
            count: initial,
            max_count,
        };
        #[cfg(feature = "std")]
        {
            Self {
                inner: Inner {
                    state: StdMutex::new(state),
                    cond: Condvar::new(),
                },
            }
        }
        #[cfg(not(feature = "std"))]
        {
            Self {
                inner: Inner {
                    state: SpinLock::new(state),
                },
            }
        }
    }

    /// Creates a binary semaphore: `max_count == 1`, starting either taken
    /// (`initially_available == false`) or available.
    #[must_use]
    pub fn new_binary(initially_available: bool) -> Self {
        Self::new(u32::from(initially_available), 1)
    }

    /// Creates a counting semaphore bounded by `max_count`, starting with
    /// `initial_count` tokens available.
    #[must_use]
    pub fn new_counting(max_count: u32, initial_count: u32) -> Self {
        Self::new(initial_count, max_count)
    }

    /// Takes one token, blocking per `timeout_ms`'s [`Timeout`] convention.
    #[must_use]
    pub fn take(&self, timeout_ms: u32) -> Status {
        let timeout = Timeout::classify(timeout_ms, backend::now_ms());

        #[cfg(feature = "std")]
        {
            let mut guard = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if guard.count > 0 {
                    guard.count -= 1;
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
                    if guard.count > 0 {
                        guard.count -= 1;
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

    /// Gives back one token, waking a single waiter if any is blocked.
    /// Excess gives past `max_count` are silently dropped.
    pub fn give(&self) {
        #[cfg(feature = "std")]
        {
            let mut guard = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            if guard.count < guard.max_count {
                guard.count += 1;
            }
            drop(guard);
            self.inner.cond.notify_one();
        }
        #[cfg(not(feature = "std"))]
        {
            let mut guard = self.inner.state.lock();
            if guard.count < guard.max_count {
                guard.count += 1;
            }
        }
    }

    /// ISR-context give. On the hosted backend an ISR is just another
    /// calling context, so this delegates straight to [`give`](Self::give);
    /// the distinct entry point exists so bare-metal callers from real
    /// interrupt context have a name that documents where they are calling
    /// from.
    pub fn give_from_isr(&self) {
        self.give();
    }

    /// Returns the number of tokens currently available.
    #[must_use]
    pub fn count(&self) -> u32 {
        #[cfg(feature = "std")]
        {
            self.inner.state.lock().unwrap_or_else(|e| e.into_inner()).count
        }
        #[cfg(not(feature = "std"))]
        {
            self.inner.state.lock().count
        }
    }
}
