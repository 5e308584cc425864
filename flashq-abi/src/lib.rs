//! flashq ABI: the types shared between the queue engine, the filesystem
//! port, and any caller (CLI, tests, a future language binding).
//!
//! Keeping these in their own crate means the engine and the port crate
//! never need to agree on anything beyond this surface — mirrors why
//! kernel/userland ABI types live in their own crate rather than being
//! duplicated on both sides.

#![no_std]
#![forbid(unsafe_code)]

pub mod access;
pub mod error;
pub mod flags;
pub mod limits;
pub mod seek;

pub use access::{AccessMode, AccessType};
pub use error::QueueError;
pub use flags::QueueFlags;
pub use limits::*;
pub use seek::SeekType;
