//! Compile-time device registry.
//!
//! Devices are contributed to a single linker section (`ferrite_devices`)
//! by [`declare_device!`], and looked up by name through [`device_find`].
//! Lookup lazily initializes the device on first access and caches the
//! result, so drivers that never get looked up never pay their init cost.

use ferrite_status::Status;

use crate::descriptor::DeviceDescriptor;

ferrite_linkset::declare_linkset! {
    /// Returns every device descriptor contributed anywhere in the linked
    /// binary via [`declare_device!`].
    pub fn device_entries() -> [DeviceDescriptor],
    section = "ferrite_devices"
}

/// Declares a device and places it in the compile-time registry.
///
/// # Examples
///
/// ```ignore
/// ferrite_hal::declare_device!(UART0, "uart0", &UART0_CONFIG, init_uart0);
/// ```
#[macro_export]
macro_rules! declare_device {
    ($static_name:ident, $name:literal, $config:expr, $init:expr) => {
        $crate::__private::linkset_entry!(
            "ferrite_devices",
            $static_name: $crate::descriptor::DeviceDescriptor = $crate::descriptor::DeviceDescriptor {
                name: $name,
                config: ($config as *const _).cast(),
                init: $init,
                state: $crate::descriptor::DeviceState::new(),
            }
        );
    };
}

#[doc(hidden)]
pub mod __private {
    pub use ferrite_linkset::linkset_entry;
}

/// Looks up a device by name, running its init function at most once.
///
/// Spins while another thread's call for the same device is in flight
/// (device init is expected to run once per process lifetime, not on a
/// hot path). Returns `Ok` with the device's capability-interface pointer
/// on success; returns the init function's own [`Status`] on failure, or
/// [`Status::InvalidParam`] if no device named `name` is registered.
pub fn device_find(name: &str) -> Result<*mut (), Status> {
    let descriptor = device_entries()
        .iter()
        .find(|d| d.name == name)
        .ok_or(Status::InvalidParam)?;
    device_init(descriptor)
}

/// Like [`device_find`] but takes the descriptor directly, for callers that
/// already hold a `&'static DeviceDescriptor` (e.g. generated driver glue).
pub fn device_get(descriptor: &'static DeviceDescriptor) -> Result<*mut (), Status> {
    device_init(descriptor)
}

fn device_init(descriptor: &DeviceDescriptor) -> Result<*mut (), Status> {
    if let Some(api) = descriptor.state.api_ptr() {
        return Ok(api);
    }
    if descriptor.state.try_begin_init() {
        match (descriptor.init)() {
            Ok(api) => {
                descriptor.state.publish_ready(api);
                Ok(api)
            }
            Err(status) => {
                ferrite_status::ferror!("device '{}' init failed: {:?}", descriptor.name, status);
                descriptor.state.publish_failed(status);
                Err(status)
            }
        }
    } else {
        loop {
            if let Some(api) = descriptor.state.api_ptr() {
                return Ok(api);
            }
            let result = descriptor.state.init_result();
            if result != Status::NotInit {
                return Err(result);
            }
            core::hint::spin_loop();
        }
    }
}

/// Returns the number of devices registered in the linker section,
/// regardless of whether any have been initialized yet.
#[must_use]
pub fn device_count() -> usize {
    device_entries().len()
}
