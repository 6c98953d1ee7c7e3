//! Ferrite HAL: a compile-time device registry with lazy, cached init, a
//! capability-based driver interface, and DMA/interrupt arbitration for
//! shared controller resources.
//!
//! A base driver trait, category traits for what a device can actually do,
//! and a linker-section registration mechanism that avoids a central
//! "list every driver" file.

#![cfg_attr(not(test), cfg_attr(not(feature = "std"), no_std))]
#![warn(missing_docs)]

pub mod capability;
pub mod descriptor;
pub mod dma;
pub mod ffi;
pub mod irq;
pub mod registry;

pub use capability::{AsyncReceive, Driver, Lifecycle, PowerManaged, SyncSend};
pub use descriptor::{DeviceDescriptor, DeviceState};
pub use dma::{DmaManager, Direction};
pub use irq::{InterruptManager, IrqHandler};
pub use registry::{device_count, device_find, device_get};
