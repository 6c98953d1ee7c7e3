//! Hosted backend: native OS threads, `std::sync::{Mutex, Condvar}`, a
//! monotonic `std::time::Instant` clock.
//!
//! This is the backend the test suite runs against: real preemptive
//! threads, not a simulation.

use std::sync::OnceLock;
use std::time::Instant;

/// Identity of the calling thread, used as recursive-mutex ownership and as
/// semaphore/queue waiter identity.
pub type ThreadId = std::thread::ThreadId;

/// Returns the identity of the calling thread.
#[must_use]
pub fn current_thread_id() -> ThreadId {
    std::thread::current().id()
}

/// Monotonic clock anchored to process start.
pub struct Clock;

static EPOCH: OnceLock<Instant> = OnceLock::new();

impl Clock {
    /// Milliseconds elapsed since the first call to any clock function in
    /// this process.
    #[must_use]
    pub fn now_ms() -> u64 {
        let epoch = EPOCH.get_or_init(Instant::now);
        u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic_non_decreasing() {
        let a = Clock::now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = Clock::now_ms();
        assert!(b >= a);
    }
}
