//! `std::fs`-backed implementation of [`flashq_port::FilesystemPort`].
//!
//! This is the port a workstation build of flashq (or the embedded target's
//! own test suite, run on the host) links against. A real embedded build
//! would instead provide a port over its flash filesystem driver — the
//! engine is identical either way.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use flashq_port::{FilesystemPort, OpenFlags, PortError, PortFile, PortResult};

/// A [`FilesystemPort`] rooted at a directory on a real filesystem.
///
/// All paths the engine passes in are relative (e.g. `"orders/.header"`);
/// `PosixPort` joins them onto `root` before touching `std::fs`. Open files
/// are kept in an internal table keyed by an opaque [`PortFile`] id so the
/// trait itself never leaks a `std::fs::File`.
pub struct PosixPort {
    root: PathBuf,
    next_id: AtomicU64,
    open_files: Mutex<HashMap<u64, File>>,
}

impl PosixPort {
    /// Root directory must already exist; `PosixPort` does not create it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_id: AtomicU64::new(1),
            open_files: Mutex::new(HashMap::new()),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn register(&self, file: File) -> PortFile {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.open_files.lock().unwrap().insert(id, file);
        PortFile(id)
    }

    fn with_file<R>(&self, file: PortFile, f: impl FnOnce(&mut File) -> std::io::Result<R>) -> PortResult<R> {
        let mut table = self.open_files.lock().unwrap();
        let handle = table.get_mut(&file.0).ok_or(PortError::NotFound)?;
        f(handle).map_err(map_io_error)
    }
}

fn map_io_error(err: std::io::Error) -> PortError {
    use std::io::ErrorKind::*;
    match err.kind() {
        NotFound => PortError::NotFound,
        AlreadyExists => PortError::AlreadyExists,
        PermissionDenied => PortError::PermissionDenied,
        _ => PortError::Io,
    }
}

fn map_io_error_dir(err: std::io::Error, path: &Path) -> PortError {
    if err.kind() == std::io::ErrorKind::AlreadyExists || path.exists() {
        PortError::AlreadyExists
    } else {
        map_io_error(err)
    }
}

impl FilesystemPort for PosixPort {
    fn mkdir(&self, path: &str) -> PortResult<()> {
        let full = self.full_path(path);
        log::debug!("mkdir {}", full.display());
        fs::create_dir(&full).map_err(|e| map_io_error_dir(e, &full))
    }

    fn rmdir_recursive(&self, path: &str) -> PortResult<()> {
        let full = self.full_path(path);
        log::debug!("rmdir_recursive {}", full.display());
        fs::remove_dir_all(&full).map_err(map_io_error)
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).exists()
    }

    fn open(&self, path: &str, flags: OpenFlags) -> PortResult<PortFile> {
        let full = self.full_path(path);
        let mut options = OpenOptions::new();
        if flags.contains(OpenFlags::READ_WRITE) {
            options.read(true).write(true);
        } else if flags.contains(OpenFlags::WRITE_ONLY) {
            options.write(true);
        } else {
            options.read(true);
        }
        if flags.contains(OpenFlags::TRUNCATE) {
            options.truncate(true);
        }
        if flags.contains(OpenFlags::CREATE) {
            options.create(true);
        }
        let file = options.open(&full).map_err(map_io_error)?;
        Ok(self.register(file))
    }

    fn create_exclusive(&self, path: &str) -> PortResult<PortFile> {
        let full = self.full_path(path);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(map_io_error)?;
        Ok(self.register(file))
    }

    fn close(&self, file: PortFile) -> PortResult<()> {
        self.open_files
            .lock()
            .unwrap()
            .remove(&file.0)
            .map(|_| ())
            .ok_or(PortError::NotFound)
    }

    fn read(&self, file: PortFile, buf: &mut [u8]) -> PortResult<usize> {
        self.with_file(file, |f| f.read(buf))
    }

    fn write(&self, file: PortFile, buf: &[u8]) -> PortResult<usize> {
        self.with_file(file, |f| {
            f.write_all(buf)?;
            Ok(buf.len())
        })
    }

    fn unlink(&self, path: &str) -> PortResult<()> {
        let full = self.full_path(path);
        fs::remove_file(&full).map_err(map_io_error)
    }
}
