//! Lock Protocol (spec.md 4.2): the three named lock files that arbitrate
//! inter-process access to a queue directory.
//!
//! Cross-process correctness rests entirely on
//! [`flashq_port::FilesystemPort::create_exclusive`] being atomic with
//! respect to existence — see that trait's docs. On a filesystem that can't
//! offer this, a port implementation is responsible for providing its own
//! equivalent arbiter; this module never probes-then-creates separately.

use flashq_abi::{AccessType, QueueError, RO_LOCK_FILE_NAME, RW_LOCK_FILE_NAME, WO_LOCK_FILE_NAME};
use flashq_port::{FilesystemPort, OpenFlags, PortError};

use crate::paths::entry_path;

fn to_queue_error(err: PortError) -> QueueError {
    match err {
        PortError::AlreadyExists => QueueError::QueueIsBusy,
        _ => QueueError::FsAccessFail,
    }
}

fn read_ro_counter(port: &dyn FilesystemPort, path: &str) -> Result<u8, QueueError> {
    let file = port.open(path, OpenFlags::READ_ONLY).map_err(to_queue_error)?;
    let mut buf = [0u8; 1];
    let n = port.read(file, &mut buf).map_err(to_queue_error)?;
    port.close(file).map_err(to_queue_error)?;
    if n != 1 {
        return Err(QueueError::FsAccessFail);
    }
    Ok(buf[0])
}

fn write_ro_counter(port: &dyn FilesystemPort, path: &str, count: u8) -> Result<(), QueueError> {
    let file = port
        .open(path, OpenFlags::READ_WRITE | OpenFlags::TRUNCATE)
        .map_err(to_queue_error)?;
    port.write(file, &[count]).map_err(to_queue_error)?;
    port.close(file).map_err(to_queue_error)
}

fn create_ro_counter(port: &dyn FilesystemPort, path: &str, count: u8) -> Result<(), QueueError> {
    let file = port.create_exclusive(path).map_err(to_queue_error)?;
    port.write(file, &[count]).map_err(to_queue_error)?;
    port.close(file).map_err(to_queue_error)
}

fn create_empty(port: &dyn FilesystemPort, path: &str) -> Result<(), QueueError> {
    let file = port.create_exclusive(path).map_err(to_queue_error)?;
    port.close(file).map_err(to_queue_error)
}

fn unlink_if_present(port: &dyn FilesystemPort, path: &str) -> Result<(), QueueError> {
    if port.exists(path) {
        port.unlink(path).map_err(|_| QueueError::FsAccessFail)?;
    }
    Ok(())
}

/// Try to acquire the lock `Open` needs for `access`, per spec.md 4.2's
/// compatibility rules. On `Err` no lock state has changed.
pub fn acquire(port: &dyn FilesystemPort, queue: &str, access: AccessType) -> Result<(), QueueError> {
    let ro = entry_path(queue, RO_LOCK_FILE_NAME);
    let wo = entry_path(queue, WO_LOCK_FILE_NAME);
    let rw = entry_path(queue, RW_LOCK_FILE_NAME);

    let wo_present = port.exists(&wo);
    let rw_present = port.exists(&rw);
    let ro_present = port.exists(&ro);

    match access {
        AccessType::ReadOnly => {
            if wo_present || rw_present {
                return Err(QueueError::QueueIsBusy);
            }
            if ro_present {
                let count = read_ro_counter(port, &ro)?;
                write_ro_counter(port, &ro, count.saturating_add(1))
            } else {
                create_ro_counter(port, &ro, 1)
            }
        }
        AccessType::WriteOnly => {
            if wo_present || rw_present || ro_present {
                return Err(QueueError::QueueIsBusy);
            }
            create_empty(port, &wo)
        }
        AccessType::ReadWrite => {
            if wo_present || rw_present || ro_present {
                return Err(QueueError::QueueIsBusy);
            }
            create_empty(port, &rw)
        }
    }
}

/// Undo whatever `acquire` did for `access`, per spec.md 4.2's release
/// rules. Idempotent in the sense that releasing a lock that is already
/// absent is a silent no-op — `Close` cannot itself fail because some
/// other process's misbehavior removed a lock file out from under us.
pub fn release(port: &dyn FilesystemPort, queue: &str, access: AccessType) -> Result<(), QueueError> {
    match access {
        AccessType::ReadOnly => {
            let ro = entry_path(queue, RO_LOCK_FILE_NAME);
            if !port.exists(&ro) {
                return Ok(());
            }
            let count = read_ro_counter(port, &ro)?;
            if count <= 1 {
                port.unlink(&ro).map_err(|_| QueueError::FsAccessFail)
            } else {
                write_ro_counter(port, &ro, count - 1)
            }
        }
        AccessType::WriteOnly => unlink_if_present(port, &entry_path(queue, WO_LOCK_FILE_NAME)),
        AccessType::ReadWrite => unlink_if_present(port, &entry_path(queue, RW_LOCK_FILE_NAME)),
    }
}

/// `true` iff a writer lock (`.wolock` or `.rwlock`) is held — the
/// precondition `Enqueue`/`Dequeue` require (spec.md 4.4.5/4.4.6).
pub fn writer_lock_present(port: &dyn FilesystemPort, queue: &str) -> bool {
    port.exists(&entry_path(queue, WO_LOCK_FILE_NAME))
        || port.exists(&entry_path(queue, RW_LOCK_FILE_NAME))
}

/// `true` iff a reader lock (`.rolock` or `.rwlock`) is held — the
/// precondition `Seek`/`GetEntry` require (spec.md 4.4.7/4.4.8).
pub fn reader_lock_present(port: &dyn FilesystemPort, queue: &str) -> bool {
    port.exists(&entry_path(queue, RO_LOCK_FILE_NAME))
        || port.exists(&entry_path(queue, RW_LOCK_FILE_NAME))
}

/// `true` iff any lock at all is held — the precondition `GetLength`
/// requires (spec.md 4.4.9).
pub fn any_lock_present(port: &dyn FilesystemPort, queue: &str) -> bool {
    writer_lock_present(port, queue) || reader_lock_present(port, queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashq_posix::PosixPort;

    fn scratch() -> (tempfile::TempDir, PosixPort) {
        let dir = tempfile::tempdir().unwrap();
        let port = PosixPort::new(dir.path());
        port.mkdir("q").unwrap();
        (dir, port)
    }

    #[test]
    fn single_reader_then_release_removes_rolock() {
        let (_dir, port) = scratch();
        acquire(&port, "q", AccessType::ReadOnly).unwrap();
        assert!(port.exists("q/.rolock"));
        release(&port, "q", AccessType::ReadOnly).unwrap();
        assert!(!port.exists("q/.rolock"));
    }

    #[test]
    fn two_readers_share_counter() {
        let (_dir, port) = scratch();
        acquire(&port, "q", AccessType::ReadOnly).unwrap();
        acquire(&port, "q", AccessType::ReadOnly).unwrap();
        assert_eq!(read_ro_counter(&port, "q/.rolock").unwrap(), 2);
        release(&port, "q", AccessType::ReadOnly).unwrap();
        assert_eq!(read_ro_counter(&port, "q/.rolock").unwrap(), 1);
        release(&port, "q", AccessType::ReadOnly).unwrap();
        assert!(!port.exists("q/.rolock"));
    }

    #[test]
    fn writer_excludes_everything() {
        let (_dir, port) = scratch();
        acquire(&port, "q", AccessType::ReadWrite).unwrap();
        assert_eq!(
            acquire(&port, "q", AccessType::ReadOnly),
            Err(QueueError::QueueIsBusy)
        );
        assert_eq!(
            acquire(&port, "q", AccessType::WriteOnly),
            Err(QueueError::QueueIsBusy)
        );
    }

    #[test]
    fn reader_excludes_writer_but_not_another_reader() {
        let (_dir, port) = scratch();
        acquire(&port, "q", AccessType::ReadOnly).unwrap();
        assert_eq!(
            acquire(&port, "q", AccessType::WriteOnly),
            Err(QueueError::QueueIsBusy)
        );
        assert!(acquire(&port, "q", AccessType::ReadOnly).is_ok());
    }
}
