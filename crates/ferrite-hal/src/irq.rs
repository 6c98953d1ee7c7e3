//! Interrupt vector dispatch.
//!
//! A fixed vector table, one handler slot per vector, re-registration
//! replaces whatever was there rather than erroring, matching how most
//! interrupt controllers are actually reconfigured at runtime (driver
//! reload, vector sharing changeover).

use ferrite_core::spinlock::SpinLock;
use ferrite_status::Status;

/// An interrupt handler. Receives the vector number it fired on and the
/// `user_data` word it was registered with.
pub type IrqHandler = fn(u32, usize);

#[derive(Clone, Copy)]
struct Entry {
    handler: Option<IrqHandler>,
    user_data: usize,
    priority: u8,
    enabled: bool,
}

/// A fixed-size interrupt vector table.
pub struct InterruptManager<const N: usize> {
    vectors: SpinLock<[Entry; N]>,
}

impl<const N: usize> InterruptManager<N> {
    /// Creates a table with every vector unregistered.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vectors: SpinLock::new(
                [Entry {
                    handler: None,
                    user_data: 0,
                    priority: 0,
                    enabled: false,
                }; N],
            ),
        }
    }

    /// Registers `handler` for `vector` at `priority`, replacing any
    /// handler already registered there, and enables the vector.
    ///
    /// Returns [`Status::InvalidParam`] if `vector >= N`.
    pub fn register(
        &self,
        vector: u32,
        handler: IrqHandler,
        user_data: usize,
        priority: u8,
    ) -> Status {
        let mut vectors = self.vectors.lock();
        let Some(entry) = vectors.get_mut(vector as usize) else {
            return Status::InvalidParam;
        };
        entry.handler = Some(handler);
        entry.user_data = user_data;
        entry.priority = priority;
        entry.enabled = true;
        Status::Ok
    }

    /// Clears whatever handler is registered for `vector`, if any.
    pub fn unregister(&self, vector: u32) -> Status {
        let mut vectors = self.vectors.lock();
        let Some(entry) = vectors.get_mut(vector as usize) else {
            return Status::InvalidParam;
        };
        *entry = Entry {
            handler: None,
            user_data: 0,
            priority: 0,
            enabled: false,
        };
        Status::Ok
    }

    /// Masks `vector` without discarding its registered handler.
    ///
    /// Returns [`Status::InvalidParam`] if `vector` is out of range or has
    /// no handler registered.
    pub fn disable(&self, vector: u32) -> Status {
        self.set_enabled(vector, false)
    }

    /// Unmasks `vector`, resuming dispatch to its registered handler.
    ///
    /// Returns [`Status::InvalidParam`] if `vector` is out of range or has
    /// no handler registered.
    pub fn enable(&self, vector: u32) -> Status {
        self.set_enabled(vector, true)
    }

    fn set_enabled(&self, vector: u32, enabled: bool) -> Status {
        let mut vectors = self.vectors.lock();
        let Some(entry) = vectors.get_mut(vector as usize) else {
            return Status::InvalidParam;
        };
        if entry.handler.is_none() {
            return Status::InvalidParam;
        }
        entry.enabled = enabled;
        Status::Ok
    }

    /// Dispatches `vector` to its registered handler, if any and enabled.
    ///
    /// Returns [`Status::NotSupported`] if no handler is registered, or the
    /// vector is currently disabled, and [`Status::InvalidParam`] if
    /// `vector` is out of range.
    pub fn dispatch(&self, vector: u32) -> Status {
        let dispatched = {
            let vectors = self.vectors.lock();
            let Some(entry) = vectors.get(vector as usize) else {
                return Status::InvalidParam;
            };
            (entry.handler, entry.enabled, entry.user_data)
        };
        match dispatched {
            (Some(handler), true, user_data) => {
                handler(vector, user_data);
                Status::Ok
            }
            _ => Status::NotSupported,
        }
    }

    /// Returns the priority `vector` was registered with, if any.
    #[must_use]
    pub fn priority(&self, vector: u32) -> Option<u8> {
        let vectors = self.vectors.lock();
        let entry = vectors.get(vector as usize)?;
        entry.handler.is_some().then_some(entry.priority)
    }
}

impl<const N: usize> Default for InterruptManager<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    static LAST_VECTOR: AtomicU32 = AtomicU32::new(0);
    static LAST_USER_DATA: AtomicUsize = AtomicUsize::new(0);

    fn record_vector(vector: u32, user_data: usize) {
        LAST_VECTOR.store(vector, Ordering::SeqCst);
        LAST_USER_DATA.store(user_data, Ordering::SeqCst);
    }

    #[test]
    fn dispatch_invokes_registered_handler_with_user_data() {
        let mgr: InterruptManager<8> = InterruptManager::new();
        assert_eq!(mgr.register(3, record_vector, 0xCAFE, 5), Status::Ok);
        assert_eq!(mgr.dispatch(3), Status::Ok);
        assert_eq!(LAST_VECTOR.load(Ordering::SeqCst), 3);
        assert_eq!(LAST_USER_DATA.load(Ordering::SeqCst), 0xCAFE);
        assert_eq!(mgr.priority(3), Some(5));
    }

    #[test]
    fn dispatch_with_no_handler_is_not_supported() {
        let mgr: InterruptManager<8> = InterruptManager::new();
        assert_eq!(mgr.dispatch(5), Status::NotSupported);
    }

    #[test]
    fn out_of_range_vector_is_invalid_param() {
        let mgr: InterruptManager<4> = InterruptManager::new();
        assert_eq!(mgr.register(9, record_vector, 0, 0), Status::InvalidParam);
        assert_eq!(mgr.dispatch(9), Status::InvalidParam);
    }

    #[test]
    fn reregistration_replaces_handler() {
        static OTHER_VECTOR: AtomicU32 = AtomicU32::new(0);
        fn other(vector: u32, _user_data: usize) {
            OTHER_VECTOR.store(vector, Ordering::SeqCst);
        }
        let mgr: InterruptManager<4> = InterruptManager::new();
        mgr.register(1, record_vector, 0, 0);
        mgr.register(1, other, 0, 0);
        mgr.dispatch(1);
        assert_eq!(OTHER_VECTOR.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_clears_handler() {
        let mgr: InterruptManager<4> = InterruptManager::new();
        mgr.register(2, record_vector, 0, 0);
        assert_eq!(mgr.unregister(2), Status::Ok);
        assert_eq!(mgr.dispatch(2), Status::NotSupported);
    }

    #[test]
    fn disabling_a_vector_suppresses_dispatch_without_forgetting_it() {
        let mgr: InterruptManager<4> = InterruptManager::new();
        mgr.register(2, record_vector, 0, 0);
        assert_eq!(mgr.disable(2), Status::Ok);
        assert_eq!(mgr.dispatch(2), Status::NotSupported);
        assert_eq!(mgr.enable(2), Status::Ok);
        assert_eq!(mgr.dispatch(2), Status::Ok);
    }

    #[test]
    fn enable_disable_on_unregistered_vector_is_invalid_param() {
        let mgr: InterruptManager<4> = InterruptManager::new();
        assert_eq!(mgr.disable(1), Status::InvalidParam);
        assert_eq!(mgr.enable(1), Status::InvalidParam);
    }
}
