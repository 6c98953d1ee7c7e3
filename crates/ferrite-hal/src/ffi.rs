//! `extern "C"` shims over the device registry.
//!
//! Mirrors [`ferrite_core::ffi`]'s scope decision: the registry is the part
//! of this crate with an obvious C-shaped surface (look up a device by
//! name, get back an opaque pointer to its capability-interface vtable).
//! `DmaManager`/`InterruptManager` are declared directly by an integrator as
//! `static`s sized for their platform and are Rust-side wiring, not
//! something a C caller looks up by name, so they are not exposed here.

use ferrite_status::Status;

use crate::registry;

/// Looks up a device by name, writing its capability-interface pointer to
/// `*out` on success.
///
/// # Safety
/// `name` must point to `name_len` valid UTF-8 bytes. `out` must be a
/// valid, properly aligned pointer to a writable `*mut ()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ferrite_hal_device_find(
    name: *const u8,
    name_len: usize,
    out: *mut *mut (),
) -> Status {
    let Some(out) = (unsafe { out.as_mut() }) else {
        return Status::NullPointer;
    };
    if name.is_null() && name_len != 0 {
        return Status::NullPointer;
    }
    let bytes = if name_len == 0 {
        &[]
    } else {
        unsafe { core::slice::from_raw_parts(name, name_len) }
    };
    let Ok(name) = core::str::from_utf8(bytes) else {
        return Status::InvalidParam;
    };
    match registry::device_find(name) {
        Ok(api) => {
            *out = api;
            Status::Ok
        }
        Err(status) => status,
    }
}

/// Returns the number of devices registered in the linker section.
#[unsafe(no_mangle)]
pub extern "C" fn ferrite_hal_device_count() -> usize {
    registry::device_count()
}
