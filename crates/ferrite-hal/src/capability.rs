//! Capability-based device interfaces.
//!
//! Every device implements the base [`Driver`] trait; a device's actual
//! capabilities are expressed as additional, independent trait
//! implementations a caller downcasts to — a collection of function-pointer
//! operations (synchronous-send, asynchronous-receive, lifecycle, power)
//! that a device optionally exposes, rather than one monolithic interface
//! every device must implement in full.

use core::any::Any;

use ferrite_status::Status;

/// Every registered device implements at least this.
pub trait Driver: Any {
    /// A short, human-readable identifier for diagnostics; need not match
    /// the registry name.
    fn driver_name(&self) -> &str;

    /// Returns this driver as `&dyn Any` so callers can downcast to a
    /// specific capability trait.
    fn as_any(&self) -> &dyn Any;
}

/// A device that accepts data synchronously: `send` does not return until
/// the device has accepted the transfer.
pub trait SyncSend: Driver {
    /// Sends `data`, blocking until the device accepts it.
    fn send(&self, data: &[u8]) -> Status;
}

/// Signature of an [`AsyncReceive`] completion callback: `(data, len)`.
pub type ReceiveCallback = fn(&[u8], usize);

/// A device that delivers incoming data asynchronously through a
/// registered callback rather than a blocking read.
pub trait AsyncReceive: Driver {
    /// Registers the callback invoked from the device's completion context
    /// (an ISR, on bare-metal backends) whenever data arrives.
    fn set_receive_callback(&self, callback: ReceiveCallback) -> Status;
}

/// A device with an explicit start/stop lifecycle distinct from its
/// [`Driver`]-level construction (e.g. a peripheral that must be armed
/// before it generates interrupts).
pub trait Lifecycle: Driver {
    /// Transitions the device into its running state.
    fn start(&self) -> Status;

    /// Transitions the device out of its running state.
    fn stop(&self) -> Status;
}

/// A device that participates in power-domain transitions.
pub trait PowerManaged: Driver {
    /// Suspends the device, preserving enough state to [`resume`](Self::resume).
    fn suspend(&self) -> Status;

    /// Resumes a device previously [`suspend`](Self::suspend)ed.
    fn resume(&self) -> Status;
}
