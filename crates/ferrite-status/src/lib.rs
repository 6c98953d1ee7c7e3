//! Status taxonomy, error-callback routing, and resource diagnostics.
//!
//! Every public Ferrite operation returns a [`Status`] rather than a
//! `Result<T, E>` — the taxonomy is fixed and uniform across every
//! primitive and the device/resource layer, matching the grouped error
//! ranges real OSAL/HAL cores use so a caller can tell a class of failure
//! apart (timeout vs. resource exhaustion vs. bad argument) without
//! matching on every variant.

#![no_std]
#![warn(missing_docs)]

pub mod diagnostics;
pub mod log;

use core::fmt;

/// Uniform status code returned by every public Ferrite operation.
///
/// `OK` is zero; every error group occupies a fixed numeric range so FFI
/// callers can bucket failures without a full match. The ranges are part of
/// the stable ABI: generic (1-19), state (20-39), resource (40-59), timeout
/// (60-79), I/O (80-99), DMA (100-119).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    /// Operation completed successfully.
    Ok = 0,

    // --- Generic (1-19) ---
    /// Unspecified failure not covered by a more specific code.
    GenericError = 1,
    /// A parameter was out of range, zero where nonzero was required, or
    /// otherwise malformed.
    InvalidParam = 2,
    /// A required pointer/handle argument was null.
    NullPointer = 3,
    /// The requested operation is not implemented on this backend.
    NotSupported = 4,

    // --- State (20-39) ---
    /// The subsystem has not been initialized yet.
    NotInit = 20,
    /// The subsystem was already initialized (returned where idempotent
    /// init is *not* the contract).
    AlreadyInit = 21,
    /// The handle refers to a slot that is not in a state valid for this
    /// operation (e.g. already deleted).
    InvalidState = 22,
    /// The resource is currently locked/claimed by another owner.
    Busy = 23,

    // --- Resource (40-59) ---
    /// A fixed-capacity pool has no free slots.
    NoMemory = 40,
    /// A singleton resource manager has no free resource matching the
    /// request (DMA channel, IRQ vector, ...).
    NoResource = 41,

    // --- Timeout (60-79) ---
    /// A bounded wait's deadline elapsed before the predicate was satisfied.
    Timeout = 60,
    /// A non-blocking send (or a send with a zero timeout) found the queue
    /// full.
    Full = 61,
    /// A non-blocking receive (or a receive with a zero timeout) found the
    /// queue empty.
    Empty = 62,

    // --- I/O (80-99) ---
    /// A generic I/O failure reported by a backend or device.
    Io = 80,
    /// A buffer overrun was detected (received more data than fits).
    Overrun = 81,
    /// A bus transaction was not acknowledged by the target.
    Nack = 82,

    // --- DMA (100-119) ---
    /// A DMA engine or channel reported an error.
    Dma = 100,
}

impl Status {
    /// Returns `true` if this status represents success.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns `true` if this status represents a failure.
    #[must_use]
    pub const fn is_err(self) -> bool {
        !self.is_ok()
    }

    /// Returns the human-readable, fixed name of this status code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::GenericError => "GENERIC_ERROR",
            Self::InvalidParam => "INVALID_PARAM",
            Self::NullPointer => "NULL_POINTER",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::NotInit => "NOT_INIT",
            Self::AlreadyInit => "ALREADY_INIT",
            Self::InvalidState => "INVALID_STATE",
            Self::Busy => "BUSY",
            Self::NoMemory => "NO_MEMORY",
            Self::NoResource => "NO_RESOURCE",
            Self::Timeout => "TIMEOUT",
            Self::Full => "FULL",
            Self::Empty => "EMPTY",
            Self::Io => "IO",
            Self::Overrun => "OVERRUN",
            Self::Nack => "NACK",
            Self::Dma => "DMA",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the human-readable name for `status`.
///
/// Thin free function mirroring the C-compatible `status_to_string` entry
/// point described by the external interface contract; prefer
/// [`Status::as_str`] from Rust callers.
#[must_use]
pub const fn status_to_string(status: Status) -> &'static str {
    status.as_str()
}

/// Returns early from the enclosing function with `status` if `status` is
/// not [`Status::Ok`].
///
/// Mirrors the `return-if-error` helper pattern spec'd for implementations;
/// every multi-step operation in `ferrite-core`/`ferrite-hal` uses this
/// instead of the `?` operator, since the uniform return type is `Status`,
/// not `Result`.
#[macro_export]
macro_rules! try_status {
    ($expr:expr) => {{
        let status = $expr;
        if status.is_err() {
            return status;
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_is_zero_and_ok() {
        assert_eq!(Status::Ok as i32, 0);
        assert!(Status::Ok.is_ok());
        assert!(!Status::Ok.is_err());
    }

    #[test]
    fn groups_are_in_range() {
        assert!((1..20).contains(&(Status::InvalidParam as i32)));
        assert!((20..40).contains(&(Status::InvalidState as i32)));
        assert!((40..60).contains(&(Status::NoResource as i32)));
        assert!((60..80).contains(&(Status::Empty as i32)));
        assert!((80..100).contains(&(Status::Overrun as i32)));
        assert!((100..120).contains(&(Status::Dma as i32)));
    }

    #[test]
    fn names_round_trip_through_display() {
        use core::fmt::Write;

        assert_eq!(status_to_string(Status::Timeout), "TIMEOUT");

        let mut buf = [0u8; 16];
        let mut writer = FixedWriter { buf: &mut buf, len: 0 };
        write!(writer, "{}", Status::NoMemory).unwrap();
        assert_eq!(writer.as_str(), "NO_MEMORY");
    }

    struct FixedWriter<'a> {
        buf: &'a mut [u8],
        len: usize,
    }

    impl<'a> FixedWriter<'a> {
        fn as_str(&self) -> &str {
            core::str::from_utf8(&self.buf[..self.len]).unwrap()
        }
    }

    impl core::fmt::Write for FixedWriter<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
            self.len += bytes.len();
            Ok(())
        }
    }
}
