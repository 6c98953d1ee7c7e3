//! Task primitive: a named, prioritized unit of execution backed by one
//! native thread per task on the hosted backend.

use core::sync::atomic::{AtomicBool, Ordering};

use ferrite_status::Status;

/// Maximum length of a task name, including no terminator (names are
/// fixed-size byte arrays, not C strings).
pub const MAX_TASK_NAME: usize = 32;

/// Lowest valid task priority. Higher numbers run preferentially wherever
/// the backend honors priority at all; the hosted backend does not
/// schedule by priority (native OS threads are used as-is), so priority is
/// accepted and stored but has no observable effect there.
pub const MIN_PRIORITY: u8 = 0;

/// Highest valid task priority.
pub const MAX_PRIORITY: u8 = 31;

/// A task's entry point. Receives the raw argument passed to
/// [`TaskConfig::arg`].
pub type TaskEntry = fn(usize);

/// Parameters used to create a task.
#[derive(Clone, Copy)]
pub struct TaskConfig {
    name: [u8; MAX_TASK_NAME],
    name_len: u8,
    priority: u8,
    entry: TaskEntry,
    arg: usize,
}

impl TaskConfig {
    /// Builds a task configuration. `name` longer than [`MAX_TASK_NAME`] is
    /// truncated; `priority` outside `0..=31` is clamped.
    #[must_use]
    pub fn new(name: &str, priority: u8, entry: TaskEntry, arg: usize) -> Self {
        let mut buf = [0u8; MAX_TASK_NAME];
        let bytes = name.as_bytes();
        let len = bytes.len().min(MAX_TASK_NAME);
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            name: buf,
            name_len: len as u8,
            priority: priority.min(MAX_PRIORITY),
            entry,
            arg,
        }
    }

    /// Returns the task's name.
    #[must_use]
    pub fn name(&self) -> &str {
        core::str::from_utf8(&self.name[..self.name_len as usize]).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Suspended,
    DeletePending,
}

struct Shared {
    state: std::sync::Mutex<RunState>,
    resume: std::sync::Condvar,
    suspended_flag: AtomicBool,
}

/// A task: a named thread of execution with a priority and a lifecycle
/// independent of whatever it is currently running.
pub struct Task {
    config: TaskConfig,
    shared: std::sync::Arc<Shared>,
    join: std::sync::Mutex<Option<std::thread::JoinHandle<()>>>,
    started: AtomicBool,
}

std::thread_local! {
    static CURRENT_TASK_NAME: core::cell::RefCell<Option<String>> =
        const { core::cell::RefCell::new(None) };
}

impl Task {
    /// Creates a task and immediately starts its native thread.
    #[must_use]
    pub fn spawn(config: TaskConfig) -> Self {
        let shared = std::sync::Arc::new(Shared {
            state: std::sync::Mutex::new(RunState::Running),
            resume: std::sync::Condvar::new(),
            suspended_flag: AtomicBool::new(false),
        });
        let task = Self {
            config,
            shared: shared.clone(),
            join: std::sync::Mutex::new(None),
            started: AtomicBool::new(false),
        };
        task.start();
        task
    }

    fn start(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let entry = self.config.entry;
        let arg = self.config.arg;
        let shared = self.shared.clone();
        let name = self.config.name().to_string();
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                CURRENT_TASK_NAME.with(|cell| *cell.borrow_mut() = Some(name));
                wait_while_suspended(&shared);
                entry(arg);
            })
            .expect("native thread spawn should not fail under normal resource limits");
        *self.join.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Suspends the task before its next point of execution observes it
    /// (the hosted backend checks at entry and is not preemptively
    /// interrupted mid-instruction).
    pub fn suspend(&self) {
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == RunState::Running {
            *state = RunState::Suspended;
            self.shared.suspended_flag.store(true, Ordering::Release);
        }
    }

    /// Resumes a suspended task.
    pub fn resume(&self) {
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == RunState::Suspended {
            *state = RunState::Running;
            self.shared.suspended_flag.store(false, Ordering::Release);
            self.shared.resume.notify_all();
        }
    }

    /// Returns the task's configured priority.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.config.priority
    }

    /// Returns the task's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.config.name()
    }

    /// Returns `true` if the task is currently suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.shared.suspended_flag.load(Ordering::Acquire)
    }

    /// Marks the task for deletion and joins its native thread, unless
    /// called from the task's own thread (a thread cannot join itself).
    ///
    /// Self-delete detaches instead: the thread runs to completion and its
    /// resources are reclaimed by the OS, matching the usual RTOS
    /// "a task may delete itself" idiom. Idempotent: a second call (or the
    /// [`Drop`] impl running afterward) finds no join handle left and is a
    /// no-op, so a pool tearing down a `Task` it never had an explicit
    /// `delete` call for still joins it correctly.
    pub fn delete(&self) -> Status {
        {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            *state = RunState::DeletePending;
        }
        self.resume();
        let handle = self.join.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let is_self = handle.thread().id() == std::thread::current().id();
            if is_self {
                drop(handle);
            } else if handle.join().is_err() {
                return Status::GenericError;
            }
        }
        Status::Ok
    }

    /// Returns the name of the task running on the calling thread, if the
    /// calling thread was created by [`Task::spawn`].
    #[must_use]
    pub fn current_name() -> Option<String> {
        CURRENT_TASK_NAME.with(|cell| cell.borrow().clone())
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        let _ = self.delete();
    }
}

fn wait_while_suspended(shared: &Shared) {
    let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
    while *state == RunState::Suspended {
        state = shared.resume.wait(state).unwrap_or_else(|e| e.into_inner());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    static RAN: AtomicUsize = AtomicUsize::new(0);

    fn bump(_arg: usize) {
        RAN.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn spawn_runs_entry_and_delete_joins() {
        let before = RAN.load(Ordering::SeqCst);
        let task = Task::spawn(TaskConfig::new("bump-task", 5, bump, 0));
        assert_eq!(task.delete(), Status::Ok);
        assert!(RAN.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn name_is_truncated_to_capacity() {
        let long = "x".repeat(MAX_TASK_NAME + 10);
        let config = TaskConfig::new(&long, 0, bump, 0);
        assert_eq!(config.name().len(), MAX_TASK_NAME);
    }

    #[test]
    fn priority_is_clamped_to_valid_range() {
        let config = TaskConfig::new("t", 200, bump, 0);
        assert_eq!(config.priority, MAX_PRIORITY);
    }

    #[test]
    fn suspend_blocks_until_resumed() {
        let flag = Arc::new(AtomicBool::new(false));
        let flag2 = flag.clone();
        static SUSPEND_ARG: AtomicUsize = AtomicUsize::new(0);
        SUSPEND_ARG.store(Arc::into_raw(flag2) as usize, Ordering::SeqCst);

        fn set_flag(arg: usize) {
            // SAFETY: the test below keeps the `Arc` alive until `delete`
            // returns, which happens after this closure has had a chance
            // to run.
            let flag = unsafe { Arc::from_raw(arg as *const AtomicBool) };
            flag.store(true, Ordering::SeqCst);
            core::mem::forget(flag);
        }

        let arg = SUSPEND_ARG.load(Ordering::SeqCst);
        let task = Task::spawn(TaskConfig::new("suspend-task", 1, set_flag, arg));
        task.suspend();
        assert!(task.is_suspended());
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!flag.load(Ordering::SeqCst));
        task.resume();
        task.delete();
        assert!(flag.load(Ordering::SeqCst));
        unsafe {
            drop(Arc::from_raw(arg as *const AtomicBool));
        }
    }

    #[test]
    fn deleting_a_task_by_name_collision_still_joins_the_other_thread() {
        let before = RAN.load(Ordering::SeqCst);
        let first = Task::spawn(TaskConfig::new("dup", 0, bump, 0));
        let second = Task::spawn(TaskConfig::new("dup", 0, bump, 0));
        assert_eq!(first.delete(), Status::Ok);
        assert_eq!(second.delete(), Status::Ok);
        assert!(RAN.load(Ordering::SeqCst) >= before + 2);
    }
}
