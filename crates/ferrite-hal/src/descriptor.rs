//! Immutable device descriptors placed in the linker-section device table.
//!
//! A descriptor is `'static` data contributed at link time by
//! [`crate::registry::declare_device!`]; its `state` is the only mutable
//! part, and it is lazily populated exactly once by
//! [`crate::registry::device_find`].

use core::sync::atomic::{AtomicPtr, AtomicU8, AtomicU32, Ordering};

use ferrite_status::Status;

const UNINIT: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

/// Per-device lazily-initialized state: whether init has run, its result,
/// and a cached pointer to the device's capability-interface vtable once
/// init succeeds.
///
/// Follows the same uninit/initializing/ready state machine as
/// [`ferrite_core::lazy::Lazy`], specialized to carry a [`Status`] and an
/// `Option`-shaped result pointer instead of an arbitrary `T`.
pub struct DeviceState {
    phase: AtomicU8,
    init_result: AtomicU32,
    api: AtomicPtr<()>,
}

impl DeviceState {
    /// Creates device state in the not-yet-initialized state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: AtomicU8::new(UNINIT),
            init_result: AtomicU32::new(Status::NotInit as u32),
            api: AtomicPtr::new(core::ptr::null_mut()),
        }
    }

    /// Returns `true` once `init` has completed successfully.
    ///
    /// The invariant `is_initialized() ⇒ api_ptr().is_some() ∧
    /// init_result() == Status::Ok` holds for this state's whole lifetime:
    /// the phase only reaches [`READY`] after `api`/`init_result` are
    /// written, and readers observe `phase` with `Acquire` ordering.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.phase.load(Ordering::Acquire) == READY
    }

    /// Returns the result of the most recent init attempt.
    #[must_use]
    pub fn init_result(&self) -> Status {
        status_from_raw(self.init_result.load(Ordering::Acquire))
    }

    /// Returns the cached capability-interface pointer, if init succeeded.
    #[must_use]
    pub fn api_ptr(&self) -> Option<*mut ()> {
        if self.is_initialized() {
            let ptr = self.api.load(Ordering::Acquire);
            debug_assert!(!ptr.is_null());
            Some(ptr)
        } else {
            None
        }
    }

    /// Claims the right to run `init` for this device, if no attempt is in
    /// flight and the device is not already ready. Returns `false` if
    /// another thread is already initializing or has already succeeded;
    /// the caller should then spin/park waiting for [`is_initialized`] or
    /// [`init_result`] to settle.
    pub(crate) fn try_begin_init(&self) -> bool {
        self.phase
            .compare_exchange(UNINIT, INITIALIZING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            || self
                .phase
                .compare_exchange(FAILED, INITIALIZING, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    /// Publishes a successful init: caches `api` and marks the device
    /// ready. Only valid to call after [`try_begin_init`] returned `true`.
    pub(crate) fn publish_ready(&self, api: *mut ()) {
        self.api.store(api, Ordering::Release);
        self.init_result.store(Status::Ok as u32, Ordering::Release);
        self.phase.store(READY, Ordering::Release);
    }

    /// Records a failed init attempt, returning the device to a state a
    /// later `device_find` call may retry from.
    pub(crate) fn publish_failed(&self, status: Status) {
        self.init_result.store(status as u32, Ordering::Release);
        self.phase.store(FAILED, Ordering::Release);
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

fn status_from_raw(raw: u32) -> Status {
    match raw {
        x if x == Status::Ok as u32 => Status::Ok,
        x if x == Status::GenericError as u32 => Status::GenericError,
        x if x == Status::InvalidParam as u32 => Status::InvalidParam,
        x if x == Status::NotSupported as u32 => Status::NotSupported,
        x if x == Status::NoResource as u32 => Status::NoResource,
        x if x == Status::Busy as u32 => Status::Busy,
        x if x == Status::Io as u32 => Status::Io,
        _ => Status::NotInit,
    }
}

/// A device's lazy init function. Runs at most once, the first time any
/// thread calls `device_find` for this device; returns the capability
/// vtable pointer to cache on success.
pub type InitFn = fn() -> Result<*mut (), Status>;

/// An immutable entry in the compile-time device table.
///
/// Placed into the `ferrite_devices` linker section by
/// [`crate::registry::declare_device!`]; never mutated after link time
/// except through its `state` field's interior mutability.
pub struct DeviceDescriptor {
    /// The device's registry name, matched by [`crate::registry::device_find`].
    pub name: &'static str,
    /// Opaque configuration pointer forwarded to `init`.
    pub config: *const (),
    /// The device's lazy initializer.
    pub init: InitFn,
    /// Lazily-populated init state.
    pub state: DeviceState,
}

// SAFETY: `config` is treated as an opaque, read-only token handed back to
// `init`; the device author is responsible for whatever it points to being
// safe to share across the threads that may call `init`.
unsafe impl Sync for DeviceDescriptor {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_not_initialized() {
        let state = DeviceState::new();
        assert!(!state.is_initialized());
        assert!(state.api_ptr().is_none());
        assert_eq!(state.init_result(), Status::NotInit);
    }

    #[test]
    fn publish_ready_satisfies_the_invariant() {
        let state = DeviceState::new();
        assert!(state.try_begin_init());
        let mut token = 0u32;
        state.publish_ready(core::ptr::from_mut(&mut token).cast());
        assert!(state.is_initialized());
        assert!(state.api_ptr().is_some());
        assert_eq!(state.init_result(), Status::Ok);
    }

    #[test]
    fn publish_failed_leaves_retryable() {
        let state = DeviceState::new();
        assert!(state.try_begin_init());
        state.publish_failed(Status::Io);
        assert!(!state.is_initialized());
        assert!(state.api_ptr().is_none());
        assert_eq!(state.init_result(), Status::Io);
        assert!(state.try_begin_init());
    }

    #[test]
    fn concurrent_begin_init_admits_only_one_winner() {
        let state = DeviceState::new();
        assert!(state.try_begin_init());
        assert!(!state.try_begin_init());
    }
}
