//! The Filesystem Port: the narrow interface `flashq-core` calls into for
//! every directory/file operation (spec.md 2 and 6). The core never touches
//! a concrete filesystem API directly — it is written entirely against
//! [`FilesystemPort`], the same way `slopos-fs`'s engine-level operations
//! (`vfs_open`, `vfs_mkdir`, ...) are written against the `FileSystem` trait
//! rather than against any one filesystem implementation.
//!
//! This crate is deliberately tiny and dependency-free beyond `bitflags`
//! and `thiserror`: it is the seam a new backend (a raw NOR-flash driver, a
//! RAM-disk for tests, `std::fs`) plugs into.

#![no_std]
#![forbid(unsafe_code)]

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Flags passed to [`FilesystemPort::open`], matching spec.md 6's
    /// named flag set (`CREATE`, `READ_ONLY`, `WRITE_ONLY`, `READ_WRITE`,
    /// `BINARY`). `BINARY` is kept as a no-op flag on POSIX-family ports
    /// (there is no text/binary distinction) but is preserved so a port for
    /// a filesystem that does draw that distinction has something to key
    /// off of.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u8 {
        const CREATE     = 1 << 0;
        const READ_ONLY  = 1 << 1;
        const WRITE_ONLY = 1 << 2;
        const READ_WRITE = 1 << 3;
        const BINARY     = 1 << 4;
        const TRUNCATE   = 1 << 5;
    }
}

/// An opaque handle to a file a port has opened. Callers never construct
/// one directly; they only pass back what [`FilesystemPort::open`] or
/// [`FilesystemPort::create_exclusive`] returned. Kept as a plain integer
/// (not an associated type) so `FilesystemPort` stays object-safe —
/// `flashq-core` holds its port as `&dyn FilesystemPort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortFile(pub u64);

/// Errors a port can report. Intentionally coarser than `QueueError`: the
/// engine maps every variant here to `QueueError::FsAccessFail` except
/// where a specific port error carries information the engine's own
/// precondition checks need (e.g. `NotFound` vs `AlreadyExists`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("path does not exist")]
    NotFound,
    #[error("path already exists")]
    AlreadyExists,
    #[error("permission denied")]
    PermissionDenied,
    #[error("no space left on the backing store")]
    NoSpace,
    #[error("file descriptor table exhausted")]
    TooManyOpenFiles,
    #[error("i/o error")]
    Io,
}

pub type PortResult<T> = Result<T, PortError>;

/// The narrow interface the queue engine depends on.
///
/// Every path argument is relative to whatever root the concrete port was
/// constructed with; the engine never changes a process-wide working
/// directory (spec.md 9's chdir redesign) and always builds full relative
/// paths itself (`"<queue-name>/.header"`, `"<queue-name>/0007"`, ...).
pub trait FilesystemPort: Send + Sync {
    /// Create a directory. Errors with `AlreadyExists` if it is already
    /// present; the engine relies on this to implement `QUEUE_EXISTS`.
    fn mkdir(&self, path: &str) -> PortResult<()>;

    /// Remove a directory and everything inside it.
    fn rmdir_recursive(&self, path: &str) -> PortResult<()>;

    /// Probe whether a path (file or directory) exists.
    fn exists(&self, path: &str) -> bool;

    /// Open an existing file. `flags` must not include `CREATE`; use
    /// [`FilesystemPort::create_exclusive`] to create one.
    fn open(&self, path: &str, flags: OpenFlags) -> PortResult<PortFile>;

    /// Atomically create a new file, failing with `AlreadyExists` if one is
    /// already there. This is the primitive the lock protocol (spec.md 4.2)
    /// relies on for correctness across processes — see that module's docs.
    fn create_exclusive(&self, path: &str) -> PortResult<PortFile>;

    /// Release a file opened via `open` or `create_exclusive`.
    fn close(&self, file: PortFile) -> PortResult<()>;

    /// Read from the current position into `buf`, returning the number of
    /// bytes produced (may be less than `buf.len()` at end of file).
    fn read(&self, file: PortFile, buf: &mut [u8]) -> PortResult<usize>;

    /// Write all of `buf` at the current position, returning the number of
    /// bytes actually written.
    fn write(&self, file: PortFile, buf: &[u8]) -> PortResult<usize>;

    /// Remove a single file.
    fn unlink(&self, path: &str) -> PortResult<()>;
}
