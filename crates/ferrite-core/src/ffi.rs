//! `extern "C"` shims over the safe [`facade`] surface.
//!
//! The safe Rust API (handles, `Status`-returning methods) is the primary
//! surface; this module is a thin `#[repr(C)]`/`extern "C"` layer on top of
//! it so a C caller can link against `libferrite_core` directly. Kept
//! narrow on purpose: task and timer creation take Rust function pointers
//! as callbacks, and marshaling a C callback across that boundary is a
//! concrete platform-adapter concern this workspace does not attempt, so
//! task/timer are not exposed here. Every handle-based primitive that does
//! not need a callback at creation time is.

use ferrite_status::Status;

use crate::facade;
use crate::handle::Handle;
use crate::sync::event::WaitMode;

/// Creates a mutex, writing its handle to `*out` on success.
///
/// # Safety
/// `out` must be a valid, properly aligned pointer to a writable `Handle`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_mutex_create(out: *mut Handle) -> Status {
    let Some(out) = (unsafe { out.as_mut() }) else {
        return Status::NullPointer;
    };
    match facade::mutex_create() {
        Ok(handle) => {
            *out = handle;
            Status::Ok
        }
        Err(status) => status,
    }
}

/// Destroys a mutex created by [`ferrite_mutex_create`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_mutex_delete(handle: Handle) -> Status {
    facade::mutex_delete(handle)
}

/// Locks a mutex. See [`facade::mutex_lock`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_mutex_lock(handle: Handle, timeout_ms: u32) -> Status {
    facade::mutex_lock(handle, timeout_ms)
}

/// Unlocks a mutex. See [`facade::mutex_unlock`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_mutex_unlock(handle: Handle) -> Status {
    facade::mutex_unlock(handle)
}

/// Creates a counting semaphore, writing its handle to `*out` on success.
///
/// # Safety
/// `out` must be a valid, properly aligned pointer to a writable `Handle`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_semaphore_create_counting(
    max_count: u32,
    initial_count: u32,
    out: *mut Handle,
) -> Status {
    let Some(out) = (unsafe { out.as_mut() }) else {
        return Status::NullPointer;
    };
    match facade::semaphore_create_counting(max_count, initial_count) {
        Ok(handle) => {
            *out = handle;
            Status::Ok
        }
        Err(status) => status,
    }
}

/// Creates a binary semaphore, writing its handle to `*out` on success.
///
/// # Safety
/// `out` must be a valid, properly aligned pointer to a writable `Handle`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_semaphore_create_binary(
    initially_available: bool,
    out: *mut Handle,
) -> Status {
    let Some(out) = (unsafe { out.as_mut() }) else {
        return Status::NullPointer;
    };
    match facade::semaphore_create_binary(initially_available) {
        Ok(handle) => {
            *out = handle;
            Status::Ok
        }
        Err(status) => status,
    }
}

/// Destroys a semaphore created by one of the `ferrite_semaphore_create_*`
/// functions.
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_semaphore_delete(handle: Handle) -> Status {
    facade::semaphore_delete(handle)
}

/// Takes one token. See [`facade::semaphore_take`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_semaphore_take(handle: Handle, timeout_ms: u32) -> Status {
    facade::semaphore_take(handle, timeout_ms)
}

/// Gives back one token. See [`facade::semaphore_give`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_semaphore_give(handle: Handle) -> Status {
    facade::semaphore_give(handle)
}

/// ISR-context give. See [`facade::semaphore_give_from_isr`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_semaphore_give_from_isr(handle: Handle) -> Status {
    facade::semaphore_give_from_isr(handle)
}

/// Creates a default-sized queue, writing its handle to `*out` on success.
///
/// # Safety
/// `out` must be a valid, properly aligned pointer to a writable `Handle`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_queue_create(out: *mut Handle) -> Status {
    let Some(out) = (unsafe { out.as_mut() }) else {
        return Status::NullPointer;
    };
    match facade::queue_create() {
        Ok(handle) => {
            *out = handle;
            Status::Ok
        }
        Err(status) => status,
    }
}

/// Destroys a queue created by [`ferrite_queue_create`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_queue_delete(handle: Handle) -> Status {
    facade::queue_delete(handle)
}

/// Enqueues `len` bytes at `data` onto the back of the queue.
///
/// # Safety
/// `data` must be valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_queue_send(
    handle: Handle,
    data: *const u8,
    len: usize,
    timeout_ms: u32,
) -> Status {
    if data.is_null() && len != 0 {
        return Status::NullPointer;
    }
    let slice = if len == 0 {
        &[]
    } else {
        unsafe { core::slice::from_raw_parts(data, len) }
    };
    facade::queue_send(handle, slice, timeout_ms)
}

/// Dequeues the front message into the `cap`-byte buffer at `out`, writing
/// the number of bytes written to `*out_len`.
///
/// # Safety
/// `out` must be valid for writes of `cap` bytes; `out_len` must be a valid,
/// properly aligned pointer to a writable `usize`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_queue_receive(
    handle: Handle,
    out: *mut u8,
    cap: usize,
    out_len: *mut usize,
    timeout_ms: u32,
) -> Status {
    let Some(out_len) = (unsafe { out_len.as_mut() }) else {
        return Status::NullPointer;
    };
    if out.is_null() && cap != 0 {
        return Status::NullPointer;
    }
    let mut len = 0usize;
    let buf = if cap == 0 {
        &mut []
    } else {
        unsafe { core::slice::from_raw_parts_mut(out, cap) }
    };
    let status = facade::queue_receive(handle, buf, &mut len, timeout_ms);
    *out_len = len;
    status
}

/// Returns the number of messages queued, or `-1` for an invalid handle.
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_queue_count(handle: Handle) -> isize {
    facade::queue_count(handle).map_or(-1, |count| count as isize)
}

/// Creates an event group with every bit clear, writing its handle to `*out`
/// on success.
///
/// # Safety
/// `out` must be a valid, properly aligned pointer to a writable `Handle`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_event_create(out: *mut Handle) -> Status {
    let Some(out) = (unsafe { out.as_mut() }) else {
        return Status::NullPointer;
    };
    match facade::event_create() {
        Ok(handle) => {
            *out = handle;
            Status::Ok
        }
        Err(status) => status,
    }
}

/// Destroys an event group created by [`ferrite_event_create`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_event_delete(handle: Handle) -> Status {
    facade::event_delete(handle)
}

/// Sets bits. See [`facade::event_set`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_event_set(handle: Handle, mask: u32) -> Status {
    facade::event_set(handle, mask)
}

/// Clears bits. See [`facade::event_clear`].
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_event_clear(handle: Handle, mask: u32) -> Status {
    facade::event_clear(handle, mask)
}

/// Waits for `mask` to become satisfied, writing the matched bits to
/// `*out_matched`.
///
/// # Safety
/// `out_matched` must be a valid, properly aligned pointer to a writable
/// `u32`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_event_wait(
    handle: Handle,
    mask: u32,
    wait_all: bool,
    auto_clear: bool,
    timeout_ms: u32,
    out_matched: *mut u32,
) -> Status {
    let Some(out_matched) = (unsafe { out_matched.as_mut() }) else {
        return Status::NullPointer;
    };
    let mode = if wait_all { WaitMode::All } else { WaitMode::Any };
    let (status, matched) = facade::event_wait(handle, mask, mode, auto_clear, timeout_ms);
    *out_matched = matched;
    status
}
