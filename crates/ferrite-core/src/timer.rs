//! Timer engine: periodic and one-shot software timers, each backed by a
//! dedicated worker thread on the hosted backend.
//!
//! A deadline is computed once per cycle and the wait re-checks on wake,
//! realized per-timer instead of through one global heap, since each
//! timer's period can change at runtime independently of every other timer.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use ferrite_status::Status;

/// A timer's callback. Invoked on the timer's dedicated worker thread, with
/// the internal lock released, so the callback may call back into any
/// other timer API including this timer's own `reset`/`stop` without
/// deadlocking.
pub type TimerCallback = fn(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    OneShot,
    Periodic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Stop,
    Shutdown,
}

struct State {
    period_ms: u64,
    command: Command,
    active: bool,
    generation: u64,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
    callback: TimerCallback,
    arg: usize,
    mode: Mode,
}

/// A software timer. Dropping it stops and joins its worker thread.
pub struct Timer {
    shared: Arc<Shared>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl Timer {
    /// Creates a timer with the given period, in the stopped state.
    #[must_use]
    pub fn new(period_ms: u64, periodic: bool, callback: TimerCallback, arg: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                period_ms,
                command: Command::Stop,
                active: false,
                generation: 0,
            }),
            wake: Condvar::new(),
            callback,
            arg,
            mode: if periodic { Mode::Periodic } else { Mode::OneShot },
        });
        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("ferrite-timer".into())
            .spawn(move || run_worker(&worker_shared))
            .expect("native thread spawn should not fail under normal resource limits");
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Starts (or restarts, per [`reset`](Self::reset) semantics) the
    /// timer counting down from its current period.
    pub fn start(&self) -> Status {
        self.reset()
    }

    /// (Re)starts the timer's countdown from its current period,
    /// regardless of whether it was already running. A timer with no
    /// distinct "start" operation of its own uses reset for both, matching
    /// the common RTOS software-timer API where `xTimerReset` on a stopped
    /// timer starts it.
    pub fn reset(&self) -> Status {
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.command = Command::Run;
        state.active = true;
        state.generation += 1;
        drop(state);
        self.shared.wake.notify_all();
        Status::Ok
    }

    /// Stops the timer; its callback will not fire again until
    /// [`start`](Self::start)/[`reset`](Self::reset).
    pub fn stop(&self) -> Status {
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.command = Command::Stop;
        state.active = false;
        state.generation += 1;
        drop(state);
        self.shared.wake.notify_all();
        Status::Ok
    }

    /// Changes the timer's period. If the timer is currently active, the
    /// countdown in progress is reset so the next cycle uses the new
    /// period; a stopped timer simply remembers it for its next start.
    pub fn set_period(&self, period_ms: u64) -> Status {
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.period_ms = period_ms;
        let active = state.active;
        if active {
            state.generation += 1;
        }
        drop(state);
        if active {
            self.shared.wake.notify_all();
        }
        Status::Ok
    }

    /// Returns `true` if the timer is currently counting down.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner()).active
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.command = Command::Shutdown;
            state.generation += 1;
        }
        self.shared.wake.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(shared: &Shared) {
    loop {
        let generation_at_wait;
        let wait_for;
        {
            let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                match state.command {
                    Command::Shutdown => return,
                    Command::Stop => {
                        state = shared.wake.wait(state).unwrap_or_else(|e| e.into_inner());
                    }
                    Command::Run => break,
                }
            }
            generation_at_wait = state.generation;
            wait_for = Duration::from_millis(state.period_ms);
        }

        let state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
        let (mut state, timeout) = shared
            .wake
            .wait_timeout(state, wait_for)
            .unwrap_or_else(|e| e.into_inner());
        let fired = timeout.timed_out() && state.generation == generation_at_wait && state.command == Command::Run;
        if fired && shared.mode == Mode::OneShot {
            state.active = false;
            state.command = Command::Stop;
        }
        drop(state);

        if fired {
            (shared.callback)(shared.arg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FIRE_COUNT: AtomicUsize = AtomicUsize::new(0);

    fn count_fire(_arg: usize) {
        FIRE_COUNT.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn one_shot_fires_once() {
        FIRE_COUNT.store(0, Ordering::SeqCst);
        let timer = Timer::new(20, false, count_fire, 0);
        timer.start();
        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), 1);
        assert!(!timer.is_active());
    }

    #[test]
    fn periodic_fires_repeatedly() {
        FIRE_COUNT.store(0, Ordering::SeqCst);
        let timer = Timer::new(15, true, count_fire, 0);
        timer.start();
        std::thread::sleep(Duration::from_millis(120));
        timer.stop();
        assert!(FIRE_COUNT.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn stop_prevents_further_fires() {
        FIRE_COUNT.store(0, Ordering::SeqCst);
        let timer = Timer::new(15, true, count_fire, 0);
        timer.start();
        std::thread::sleep(Duration::from_millis(40));
        timer.stop();
        let after_stop = FIRE_COUNT.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn reset_restarts_countdown_from_current_period() {
        FIRE_COUNT.store(0, Ordering::SeqCst);
        let timer = Timer::new(50, false, count_fire, 0);
        timer.start();
        std::thread::sleep(Duration::from_millis(30));
        timer.reset();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), 0);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_period_on_active_timer_takes_effect_immediately() {
        FIRE_COUNT.store(0, Ordering::SeqCst);
        let timer = Timer::new(500, false, count_fire, 0);
        timer.start();
        std::thread::sleep(Duration::from_millis(20));
        timer.set_period(15);
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), 1);
    }
}
