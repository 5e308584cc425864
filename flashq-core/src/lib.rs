//! The flashq engine: on-disk layout, lock protocol, handle table, and the
//! nine public queue operations from spec.md 4.4.
//!
//! `#![no_std]`, no heap allocation — every bounded collection here is a
//! fixed-capacity array, the same discipline `slopos-fs`'s fixed
//! `[FileDescriptor; FILEIO_MAX_OPEN_FILES]` table uses for exactly the
//! same reason: this code is meant to run on the embedded target spec.md
//! describes, not just its POSIX host build.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod engine;
pub mod handle;
pub mod layout;
pub mod lock;
pub mod paths;
pub mod util;

pub use engine::{Engine, QueueHandle};
pub use flashq_abi::{AccessMode, AccessType, QueueError, QueueFlags, SeekType};
