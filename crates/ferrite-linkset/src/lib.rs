//! Safe wrappers for linker-section-based static registries.
//!
//! This crate encapsulates the unsafe patterns required to read typed data
//! placed into a linker section behind safe declarative macros. It provides
//! two macros:
//!
//! - [`declare_linkset!`] — declares a function that returns a typed
//!   `&'static [T]` from a linker section.
//! - [`linkset_entry!`] — places a typed static into the matching section.
//!
//! Sections are bracketed using the `__start_<section>` / `__stop_<section>`
//! symbols that GNU ld, gold, and lld all synthesize automatically for any
//! section whose name is a valid C identifier — no custom linker script is
//! required. This is the same bracketing convention tools like `linkme` rely
//! on, and it works equally well on a hosted ELF binary (used for the
//! `ferrite-hal` device registry under the `std` backend) and on a bare-metal
//! image built with a linker script that defines the same symbols.

#![no_std]
#![warn(missing_docs)]

/// Declares a function that returns a typed slice from a linker section.
///
/// The section must contain only values placed via a matching
/// [`linkset_entry!`] invocation using the same `section` name.
///
/// # Examples
///
/// ```ignore
/// ferrite_linkset::declare_linkset! {
///     /// Returns all registered device descriptors.
///     pub fn device_entries() -> [DeviceDescriptor],
///     section = "ferrite_devices"
/// }
/// ```
#[macro_export]
macro_rules! declare_linkset {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident() -> [$ty:ty],
        section = $section:literal
    ) => {
        $(#[$meta])*
        $vis fn $name() -> &'static [$ty] {
            unsafe extern "C" {
                #[link_name = concat!("__start_", $section)]
                static LINKSET_START: u8;
                #[link_name = concat!("__stop_", $section)]
                static LINKSET_END: u8;
            }

            // SAFETY: The linker (via the auto-generated `__start_`/`__stop_`
            // symbols, or an explicit linker script providing the same names)
            // brackets a contiguous run of `T` values placed by
            // `linkset_entry!`. The region is valid for the program's
            // lifetime.
            unsafe {
                let start = ::core::ptr::addr_of!(LINKSET_START).cast::<$ty>();
                let end = ::core::ptr::addr_of!(LINKSET_END).cast::<$ty>();
                let count = end.offset_from(start) as usize;
                if count == 0 {
                    return &[];
                }
                ::core::slice::from_raw_parts(start, count)
            }
        }
    };
}

/// Places a typed static into the named linker section.
///
/// # Examples
///
/// ```ignore
/// ferrite_linkset::linkset_entry!("ferrite_devices",
///     UART0_DEVICE: DeviceDescriptor = DeviceDescriptor { /* ... */ }
/// );
/// ```
#[macro_export]
macro_rules! linkset_entry {
    ($section:literal, $name:ident : $ty:ty = $expr:expr) => {
        #[used]
        #[unsafe(link_section = $section)]
        static $name: $ty = $expr;
    };
}
