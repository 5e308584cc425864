//! Closed enumerations for `Open`'s `access`/`mode` arguments.
//!
//! spec.md's REDESIGN FLAGS call out that the original source accepted any
//! `mode` value up to an `ACCESS_MODE_MAX` sentinel without checking it was
//! actually one of the defined modes. Here both arguments are closed enums:
//! anything that doesn't parse is rejected as `QueueError::InvalidArg` by
//! the caller (there is no wire representation to parse at this layer,
//! Rust's type system is the enforcement).

/// How a handle may touch the queue's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessType {
    pub fn can_read(self) -> bool {
        matches!(self, AccessType::ReadOnly | AccessType::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessType::WriteOnly | AccessType::ReadWrite)
    }
}

/// The payload framing mode a queue was opened with.
///
/// `BinaryPacked` is the mode spec.md's worked examples use (raw
/// variable-length binary payloads, one per file). `MessageLog` mirrors the
/// header's `MESSAGE_LOG` flag for a queue whose entries are themselves
/// newline-delimited text records; the engine does not interpret payload
/// bytes differently between the two — `mode` is advisory metadata a caller
/// can branch on, kept only because spec.md's `Open` signature carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    BinaryPacked,
    MessageLog,
}
