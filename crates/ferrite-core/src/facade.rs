//! Global C-style surface: `create/delete/operation(handle, …)` per
//! primitive over opaque [`Handle`]s, backed by one [`Lazy`]-initialized
//! [`Pool`] per primitive type.
//!
//! Every global here is a `static` of this shape rather than a
//! free-floating mutable, modeling each pool as a module-scoped value with
//! an explicit init lifecycle instead of ad hoc `unsafe` statics.
//!
//! This module is `std`-only: it owns [`task`](crate::task) and
//! [`timer`](crate::timer) pools, and both require native threads.

use ferrite_status::diagnostics::{report_error, ResourceStats};
use ferrite_status::Status;

use crate::handle::Handle;
use crate::lazy::Lazy;
use crate::pools::{
    Pool, DEFAULT_EVENT_CAPACITY, DEFAULT_MUTEX_CAPACITY, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SEMAPHORE_CAPACITY, DEFAULT_TASK_CAPACITY, DEFAULT_TIMER_CAPACITY,
};
use crate::sync::event::WaitMode;
use crate::sync::queue::DefaultQueue;
use crate::sync::{EventGroup, Mutex, Semaphore};
use crate::task::{Task, TaskConfig, TaskEntry};
use crate::timer::{Timer, TimerCallback};

static MUTEXES: Lazy<Pool<Mutex, DEFAULT_MUTEX_CAPACITY>> = Lazy::new(Pool::new);
static SEMAPHORES: Lazy<Pool<Semaphore, DEFAULT_SEMAPHORE_CAPACITY>> = Lazy::new(Pool::new);
static QUEUES: Lazy<Pool<DefaultQueue, DEFAULT_QUEUE_CAPACITY>> = Lazy::new(Pool::new);
static EVENTS: Lazy<Pool<EventGroup, DEFAULT_EVENT_CAPACITY>> = Lazy::new(Pool::new);
static TASKS: Lazy<Pool<Task, DEFAULT_TASK_CAPACITY>> = Lazy::new(Pool::new);
static TIMERS: Lazy<Pool<Timer, DEFAULT_TIMER_CAPACITY>> = Lazy::new(Pool::new);

/// Per-primitive-type active/peak resource counters.
pub static MUTEX_STATS: ResourceStats = ResourceStats::new();
/// See [`MUTEX_STATS`].
pub static SEMAPHORE_STATS: ResourceStats = ResourceStats::new();
/// See [`MUTEX_STATS`].
pub static QUEUE_STATS: ResourceStats = ResourceStats::new();
/// See [`MUTEX_STATS`].
pub static EVENT_STATS: ResourceStats = ResourceStats::new();
/// See [`MUTEX_STATS`].
pub static TASK_STATS: ResourceStats = ResourceStats::new();
/// See [`MUTEX_STATS`].
pub static TIMER_STATS: ResourceStats = ResourceStats::new();

/// Reports pool exhaustion through the global error callback and returns
/// [`Status::NoMemory`], so a registered callback sees every `create`
/// rejection alongside the return value the caller already gets.
fn pool_exhausted(module: &str) -> Status {
    report_error(Status::NoMemory, module, format_args!("pool exhausted"));
    Status::NoMemory
}

// --- Mutex ------------------------------------------------------------

/// Creates a new unlocked mutex, returning its handle.
pub fn mutex_create() -> Result<Handle, Status> {
    let handle = MUTEXES.create(Mutex::new).ok_or_else(|| pool_exhausted("mutex"))?;
    MUTEX_STATS.record_create();
    Ok(handle)
}

/// Destroys a mutex created by [`mutex_create`].
pub fn mutex_delete(handle: Handle) -> Status {
    if MUTEXES.delete(handle) {
        MUTEX_STATS.record_delete();
        Status::Ok
    } else {
        Status::InvalidParam
    }
}

/// Locks the mutex named by `handle`. See [`Mutex::lock`].
pub fn mutex_lock(handle: Handle, timeout_ms: u32) -> Status {
    match MUTEXES.get(handle) {
        Some(mutex) => mutex.lock(timeout_ms),
        None => Status::InvalidParam,
    }
}

/// Unlocks the mutex named by `handle`. See [`Mutex::unlock`].
pub fn mutex_unlock(handle: Handle) -> Status {
    match MUTEXES.get(handle) {
        Some(mutex) => mutex.unlock(),
        None => Status::InvalidParam,
    }
}

// --- Semaphore ----------------------------------------------------------

/// Creates a counting semaphore. See [`Semaphore::new`].
pub fn semaphore_create(initial_count: u32, max_count: u32) -> Result<Handle, Status> {
    let handle = SEMAPHORES
        .create(|| Semaphore::new(initial_count, max_count))
        .ok_or_else(|| pool_exhausted("semaphore"))?;
    SEMAPHORE_STATS.record_create();
    Ok(handle)
}

/// Creates a binary semaphore. See [`Semaphore::new_binary`].
pub fn semaphore_create_binary(initially_available: bool) -> Result<Handle, Status> {
    let handle = SEMAPHORES
        .create(|| Semaphore::new_binary(initially_available))
        .ok_or_else(|| pool_exhausted("semaphore"))?;
    SEMAPHORE_STATS.record_create();
    Ok(handle)
}

/// Creates a counting semaphore. See [`Semaphore::new_counting`].
pub fn semaphore_create_counting(max_count: u32, initial_count: u32) -> Result<Handle, Status> {
    let handle = SEMAPHORES
        .create(|| Semaphore::new_counting(max_count, initial_count))
        .ok_or_else(|| pool_exhausted("semaphore"))?;
    SEMAPHORE_STATS.record_create();
    Ok(handle)
}

/// Destroys a semaphore created by one of the `semaphore_create*` functions.
pub fn semaphore_delete(handle: Handle) -> Status {
    if SEMAPHORES.delete(handle) {
        SEMAPHORE_STATS.record_delete();
        Status::Ok
    } else {
        Status::InvalidParam
    }
}

/// Takes one token. See [`Semaphore::take`].
pub fn semaphore_take(handle: Handle, timeout_ms: u32) -> Status {
    match SEMAPHORES.get(handle) {
        Some(sem) => sem.take(timeout_ms),
        None => Status::InvalidParam,
    }
}

/// Gives back one token. See [`Semaphore::give`].
pub fn semaphore_give(handle: Handle) -> Status {
    match SEMAPHORES.get(handle) {
        Some(sem) => {
            sem.give();
            Status::Ok
        }
        None => Status::InvalidParam,
    }
}

/// ISR-context give. See [`Semaphore::give_from_isr`].
pub fn semaphore_give_from_isr(handle: Handle) -> Status {
    match SEMAPHORES.get(handle) {
        Some(sem) => {
            sem.give_from_isr();
            Status::Ok
        }
        None => Status::InvalidParam,
    }
}

// --- Queue ----------------------------------------------------------------

/// Creates a queue sized by [`crate::sync::queue::DefaultQueue`].
pub fn queue_create() -> Result<Handle, Status> {
    let handle = QUEUES.create(DefaultQueue::new).ok_or_else(|| pool_exhausted("queue"))?;
    QUEUE_STATS.record_create();
    Ok(handle)
}

/// Destroys a queue created by [`queue_create`].
///
/// Closes the queue first so any sender or receiver blocked with
/// `WAIT_FOREVER` wakes with [`Status::InvalidState`] instead of staying
/// parked on a slot that is about to be torn down.
pub fn queue_delete(handle: Handle) -> Status {
    if let Some(queue) = QUEUES.get(handle) {
        queue.close();
    }
    if QUEUES.delete(handle) {
        QUEUE_STATS.record_delete();
        Status::Ok
    } else {
        Status::InvalidParam
    }
}

/// Enqueues `data` at the back. See [`DefaultQueue::send_timeout`].
pub fn queue_send(handle: Handle, data: &[u8], timeout_ms: u32) -> Status {
    match QUEUES.get(handle) {
        Some(queue) => queue.send_timeout(data, timeout_ms),
        None => Status::InvalidParam,
    }
}

/// Enqueues `data` at the front. See [`DefaultQueue::send_front`].
pub fn queue_send_front(handle: Handle, data: &[u8], timeout_ms: u32) -> Status {
    match QUEUES.get(handle) {
        Some(queue) => queue.send_front(data, timeout_ms),
        None => Status::InvalidParam,
    }
}

/// Dequeues the front message. See [`DefaultQueue::receive`].
pub fn queue_receive(handle: Handle, out: &mut [u8], out_len: &mut usize, timeout_ms: u32) -> Status {
    match QUEUES.get(handle) {
        Some(queue) => queue.receive(out, out_len, timeout_ms),
        None => Status::InvalidParam,
    }
}

/// Reads the front message without removing it. See [`DefaultQueue::peek`].
pub fn queue_peek(handle: Handle, out: &mut [u8], out_len: &mut usize) -> Status {
    match QUEUES.get(handle) {
        Some(queue) => queue.peek(out, out_len),
        None => Status::InvalidParam,
    }
}

/// ISR-context send. See [`DefaultQueue::send_from_isr`].
pub fn queue_send_from_isr(handle: Handle, data: &[u8]) -> Status {
    match QUEUES.get(handle) {
        Some(queue) => queue.send_from_isr(data),
        None => Status::InvalidParam,
    }
}

/// ISR-context receive. See [`DefaultQueue::receive_from_isr`].
pub fn queue_receive_from_isr(handle: Handle, out: &mut [u8], out_len: &mut usize) -> Status {
    match QUEUES.get(handle) {
        Some(queue) => queue.receive_from_isr(out, out_len),
        None => Status::InvalidParam,
    }
}

/// Returns the number of messages queued, or `None` for an invalid handle.
#[must_use]
pub fn queue_count(handle: Handle) -> Option<usize> {
    QUEUES.get(handle).map(DefaultQueue::count)
}

// --- Event flags ---------------------------------------------------------

/// Creates an event group with every bit clear.
pub fn event_create() -> Result<Handle, Status> {
    let handle = EVENTS.create(EventGroup::new).ok_or_else(|| pool_exhausted("event"))?;
    EVENT_STATS.record_create();
    Ok(handle)
}

/// Destroys an event group created by [`event_create`].
pub fn event_delete(handle: Handle) -> Status {
    if EVENTS.delete(handle) {
        EVENT_STATS.record_delete();
        Status::Ok
    } else {
        Status::InvalidParam
    }
}

/// Sets bits. See [`EventGroup::set`].
pub fn event_set(handle: Handle, mask: u32) -> Status {
    match EVENTS.get(handle) {
        Some(group) => {
            group.set(mask);
            Status::Ok
        }
        None => Status::InvalidParam,
    }
}

/// Clears bits. See [`EventGroup::clear`].
pub fn event_clear(handle: Handle, mask: u32) -> Status {
    match EVENTS.get(handle) {
        Some(group) => {
            group.clear(mask);
            Status::Ok
        }
        None => Status::InvalidParam,
    }
}

/// Returns the currently set bits, or `None` for an invalid handle.
#[must_use]
pub fn event_get(handle: Handle) -> Option<u32> {
    EVENTS.get(handle).map(EventGroup::get)
}

/// Waits for `mask` to become satisfied. See [`EventGroup::wait`].
pub fn event_wait(
    handle: Handle,
    mask: u32,
    mode: WaitMode,
    auto_clear: bool,
    timeout_ms: u32,
) -> (Status, u32) {
    match EVENTS.get(handle) {
        Some(group) => group.wait(mask, mode, auto_clear, timeout_ms),
        None => (Status::InvalidParam, 0),
    }
}

// --- Task ------------------------------------------------------------------

/// Creates and starts a task. See [`TaskConfig::new`].
pub fn task_create(name: &str, priority: u8, entry: TaskEntry, arg: usize) -> Result<Handle, Status> {
    let config = TaskConfig::new(name, priority, entry, arg);
    let handle = TASKS.create(|| Task::spawn(config)).ok_or_else(|| pool_exhausted("task"))?;
    TASK_STATS.record_create();
    Ok(handle)
}

/// Marks a task for deletion and joins it (unless it is deleting itself).
/// See [`Task::delete`].
pub fn task_delete(handle: Handle) -> Status {
    let Some(task) = TASKS.get(handle) else {
        return Status::InvalidParam;
    };
    let status = task.delete();
    if TASKS.delete(handle) {
        TASK_STATS.record_delete();
    }
    status
}

/// Suspends a task. See [`Task::suspend`].
pub fn task_suspend(handle: Handle) -> Status {
    match TASKS.get(handle) {
        Some(task) => {
            task.suspend();
            Status::Ok
        }
        None => Status::InvalidParam,
    }
}

/// Resumes a suspended task. See [`Task::resume`].
pub fn task_resume(handle: Handle) -> Status {
    match TASKS.get(handle) {
        Some(task) => {
            task.resume();
            Status::Ok
        }
        None => Status::InvalidParam,
    }
}

// --- Timer -------------------------------------------------------------

/// Creates a timer in the stopped state. See [`Timer::new`].
pub fn timer_create(
    period_ms: u64,
    periodic: bool,
    callback: TimerCallback,
    arg: usize,
) -> Result<Handle, Status> {
    if period_ms == 0 {
        return Err(Status::InvalidParam);
    }
    let handle = TIMERS
        .create(|| Timer::new(period_ms, periodic, callback, arg))
        .ok_or_else(|| pool_exhausted("timer"))?;
    TIMER_STATS.record_create();
    Ok(handle)
}

/// Destroys a timer created by [`timer_create`], joining its worker thread.
pub fn timer_delete(handle: Handle) -> Status {
    if TIMERS.delete(handle) {
        TIMER_STATS.record_delete();
        Status::Ok
    } else {
        Status::InvalidParam
    }
}

/// Starts (or restarts) a timer's countdown. See [`Timer::start`].
pub fn timer_start(handle: Handle) -> Status {
    match TIMERS.get(handle) {
        Some(timer) => timer.start(),
        None => Status::InvalidParam,
    }
}

/// Restarts a timer's countdown from its current period. See
/// [`Timer::reset`].
pub fn timer_reset(handle: Handle) -> Status {
    match TIMERS.get(handle) {
        Some(timer) => timer.reset(),
        None => Status::InvalidParam,
    }
}

/// Stops a timer. See [`Timer::stop`].
pub fn timer_stop(handle: Handle) -> Status {
    match TIMERS.get(handle) {
        Some(timer) => timer.stop(),
        None => Status::InvalidParam,
    }
}

/// Changes a timer's period. See [`Timer::set_period`].
pub fn timer_set_period(handle: Handle, period_ms: u64) -> Status {
    ferrite_status::try_status!(if period_ms == 0 {
        Status::InvalidParam
    } else {
        Status::Ok
    });
    match TIMERS.get(handle) {
        Some(timer) => timer.set_period(period_ms),
        None => Status::InvalidParam,
    }
}

/// Returns whether a timer is currently counting down, or `None` for an
/// invalid handle.
#[must_use]
pub fn timer_is_active(handle: Handle) -> Option<bool> {
    TIMERS.get(handle).map(Timer::is_active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeout::WAIT_FOREVER;

    #[test]
    fn mutex_create_lock_unlock_delete_round_trip() {
        let handle = mutex_create().unwrap();
        assert_eq!(mutex_lock(handle, WAIT_FOREVER), Status::Ok);
        assert_eq!(mutex_unlock(handle), Status::Ok);
        assert_eq!(mutex_delete(handle), Status::Ok);
        assert_eq!(mutex_lock(handle, 0), Status::InvalidParam);
    }

    #[test]
    fn semaphore_counting_boundary_scenario() {
        // counting(max=3, init=0): gives beyond max are dropped, takes
        // beyond the current count time out.
        let handle = semaphore_create_counting(3, 0).unwrap();
        assert_eq!(semaphore_give(handle), Status::Ok);
        assert_eq!(semaphore_give(handle), Status::Ok);
        assert_eq!(semaphore_give(handle), Status::Ok);
        assert_eq!(semaphore_give(handle), Status::Ok); // excess dropped
        assert_eq!(semaphore_take(handle, 0), Status::Ok);
        assert_eq!(semaphore_take(handle, 0), Status::Ok);
        assert_eq!(semaphore_take(handle, 0), Status::Ok);
        assert_eq!(semaphore_take(handle, 0), Status::Timeout);
        semaphore_delete(handle);
    }

    #[test]
    fn queue_send_receive_round_trip() {
        let handle = queue_create().unwrap();
        assert_eq!(queue_send(handle, b"hi", 0), Status::Ok);
        let mut out = [0u8; 64];
        let mut len = 0;
        assert_eq!(queue_receive(handle, &mut out, &mut len, 0), Status::Ok);
        assert_eq!(&out[..len], b"hi");
        assert_eq!(queue_count(handle), Some(0));
        queue_delete(handle);
    }

    #[test]
    fn event_set_wait_auto_clear_boundary_scenario() {
        let handle = event_create().unwrap();
        assert_eq!(event_set(handle, 0x5), Status::Ok);
        let (status, matched) = event_wait(handle, 0x4, WaitMode::All, true, 0);
        assert_eq!(status, Status::Ok);
        assert_eq!(matched, 0x4);
        assert_eq!(event_get(handle), Some(0x1));
        event_delete(handle);
    }

    #[test]
    fn unknown_handle_is_invalid_param_everywhere() {
        let bogus = mutex_create().unwrap();
        mutex_delete(bogus);
        assert_eq!(mutex_lock(bogus, 0), Status::InvalidParam);
        assert_eq!(mutex_unlock(bogus), Status::InvalidParam);
        assert_eq!(mutex_delete(bogus), Status::InvalidParam);
    }

    static TASK_RAN: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    fn bump_task(_arg: usize) {
        TASK_RAN.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    #[test]
    fn task_create_runs_and_delete_joins() {
        let before = TASK_RAN.load(std::sync::atomic::Ordering::SeqCst);
        let handle = task_create("facade-task", 5, bump_task, 0).unwrap();
        assert_eq!(task_delete(handle), Status::Ok);
        assert!(TASK_RAN.load(std::sync::atomic::Ordering::SeqCst) > before);
        assert_eq!(task_suspend(handle), Status::InvalidParam);
    }

    static TIMER_FIRED: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    fn count_fire(_arg: usize) {
        TIMER_FIRED.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    #[test]
    fn timer_one_shot_boundary_scenario() {
        TIMER_FIRED.store(0, std::sync::atomic::Ordering::SeqCst);
        let handle = timer_create(50, false, count_fire, 0).unwrap();
        assert_eq!(timer_start(handle), Status::Ok);
        std::thread::sleep(std::time::Duration::from_millis(90));
        assert_eq!(TIMER_FIRED.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(timer_is_active(handle), Some(false));
        timer_delete(handle);
    }

    #[test]
    fn timer_zero_period_is_invalid_param() {
        assert_eq!(timer_create(0, false, count_fire, 0), Err(Status::InvalidParam));
    }
}
