//! Queue Engine (spec.md 4.4): the nine public operations, built on the
//! layout manager, lock protocol and handle table.
//!
//! Mirrors `slopos-fs`'s `vfs::ops` module: a thin layer of engine-level
//! functions that validate arguments, consult a trait object for every
//! filesystem side effect, and translate the result into the crate's own
//! error enum. Nothing here ever changes a process-wide working directory
//! (spec.md 9's first redesign) — every path is built by [`crate::paths`]
//! from the queue name handed to each call.

use flashq_abi::{
    AccessMode, AccessType, HEADER_FILE_NAME, HEADER_SIZE, LUT_FILE_NAME, MAX_NAME_LEN, QueueError,
    QueueFlags, SeekType,
};
use flashq_port::{FilesystemPort, OpenFlags, PortError, PortFile};
use log::{debug, info, warn};
use spin::Mutex;

use crate::handle::{HandleEntry, HandleTable};
use crate::layout::{Header, Lut, mint_reference, reference_to_name};
use crate::paths::entry_path;

pub use crate::handle::QueueHandle;

fn to_fs_err(_: PortError) -> QueueError {
    QueueError::FsAccessFail
}

fn read_up_to(port: &dyn FilesystemPort, file: PortFile, buf: &mut [u8]) -> Result<usize, QueueError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = port.read(file, &mut buf[filled..]).map_err(to_fs_err)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn write_all(port: &dyn FilesystemPort, file: PortFile, buf: &[u8]) -> Result<(), QueueError> {
    let mut written = 0;
    while written < buf.len() {
        let n = port.write(file, &buf[written..]).map_err(to_fs_err)?;
        if n == 0 {
            return Err(QueueError::FsAccessFail);
        }
        written += n;
    }
    Ok(())
}

fn load_header(port: &dyn FilesystemPort, queue: &str) -> Result<Header, QueueError> {
    let path = entry_path(queue, HEADER_FILE_NAME);
    let file = port.open(&path, OpenFlags::READ_ONLY).map_err(to_fs_err)?;
    let mut bytes = [0u8; HEADER_SIZE];
    let n = read_up_to(port, file, &mut bytes)?;
    port.close(file).map_err(to_fs_err)?;
    if n != HEADER_SIZE {
        return Err(QueueError::FsAccessFail);
    }
    Header::decode(&bytes)
}

fn store_header(port: &dyn FilesystemPort, queue: &str, header: &Header) -> Result<(), QueueError> {
    let path = entry_path(queue, HEADER_FILE_NAME);
    let file = port
        .open(&path, OpenFlags::CREATE | OpenFlags::READ_WRITE | OpenFlags::TRUNCATE)
        .map_err(to_fs_err)?;
    write_all(port, file, &header.encode())?;
    port.close(file).map_err(to_fs_err)
}

fn load_lut(port: &dyn FilesystemPort, queue: &str, max_entries: u8) -> Result<Lut, QueueError> {
    let path = entry_path(queue, LUT_FILE_NAME);
    let file = port.open(&path, OpenFlags::READ_ONLY).map_err(to_fs_err)?;
    let mut bytes = [0u8; flashq_abi::LUT_FILE_SIZE_MAX];
    let want = max_entries as usize * flashq_abi::LUT_ENTRY_SIZE;
    let n = read_up_to(port, file, &mut bytes[..want])?;
    port.close(file).map_err(to_fs_err)?;
    if n != want {
        return Err(QueueError::FsAccessFail);
    }
    Lut::decode(max_entries, &bytes[..want])
}

fn store_lut(port: &dyn FilesystemPort, queue: &str, lut: &Lut) -> Result<(), QueueError> {
    let path = entry_path(queue, LUT_FILE_NAME);
    let file = port
        .open(&path, OpenFlags::CREATE | OpenFlags::READ_WRITE | OpenFlags::TRUNCATE)
        .map_err(to_fs_err)?;
    let mut bytes = [0u8; flashq_abi::LUT_FILE_SIZE_MAX];
    lut.encode_into(&mut bytes[..lut.byte_len()]);
    write_all(port, file, &bytes[..lut.byte_len()])?;
    port.close(file).map_err(to_fs_err)
}

fn validate_name(name: &str) -> Result<(), QueueError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(QueueError::InvalidArg);
    }
    Ok(())
}

/// The queue engine, generic over its [`FilesystemPort`]. One `Engine` is
/// meant to be shared the way the teacher shares its VFS state: wrapped in
/// a caller-supplied `spin::Mutex<Engine<P>>` when called from more than
/// one thread (spec.md 5). The handle table is always internally
/// mutex-protected (spec.md 9's last bullet), independent of that.
pub struct Engine<P: FilesystemPort> {
    port: P,
    handles: Mutex<HandleTable<{ flashq_abi::HANDLE_LIST_MAX }>>,
}

impl<P: FilesystemPort> Engine<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            handles: Mutex::new(HandleTable::new()),
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// spec.md 4.4.1.
    pub fn create(
        &self,
        name: &str,
        max_entries: u8,
        max_entry_size: u16,
        flags: QueueFlags,
    ) -> Result<(), QueueError> {
        validate_name(name)?;
        if max_entries == 0 || max_entry_size == 0 {
            return Err(QueueError::InvalidArg);
        }
        if self.port.exists(name) {
            return Err(QueueError::QueueExists);
        }

        let result = (|| {
            self.port.mkdir(name).map_err(to_fs_err)?;
            store_header(&self.port, name, &Header::new(max_entry_size, max_entries, flags))?;
            store_lut(&self.port, name, &Lut::zeroed(max_entries))
        })();

        if let Err(err) = result {
            let _ = self.port.rmdir_recursive(name);
            warn!("create {name} failed: {err}");
        } else {
            info!("create {name} max_entries={max_entries} max_entry_size={max_entry_size}");
        }
        result
    }

    /// spec.md 4.4.2.
    pub fn destroy(&self, name: &str) -> Result<(), QueueError> {
        validate_name(name)?;
        if !self.port.exists(name) {
            return Ok(());
        }
        {
            let handles = self.handles.lock();
            if handles.find_by_name(name).is_some() {
                warn!("destroy {name}: QUEUE_IS_BUSY, open in this process");
                return Err(QueueError::QueueIsBusy);
            }
        }
        if crate::lock::any_lock_present(&self.port, name) {
            warn!("destroy {name}: QUEUE_IS_BUSY, held by another opener");
            return Err(QueueError::QueueIsBusy);
        }
        let result = self.port.rmdir_recursive(name).map_err(to_fs_err);
        if result.is_ok() {
            info!("destroy {name}");
        }
        result
    }

    /// spec.md 4.4.3.
    pub fn open(&self, name: &str, access: AccessType, mode: AccessMode) -> Result<QueueHandle, QueueError> {
        validate_name(name)?;

        let mut handles = self.handles.lock();
        if let Some((handle, entry)) = handles.find_by_name(name) {
            return if entry.access == access && entry.mode == mode {
                Ok(handle)
            } else {
                Err(QueueError::QueueOpened)
            };
        }

        if !self.port.exists(name) {
            return Err(QueueError::QueueMissing);
        }

        if let Err(err) = crate::lock::acquire(&self.port, name, access) {
            if err == QueueError::QueueIsBusy {
                warn!("open {name}: QUEUE_IS_BUSY, incompatible lock held");
            }
            return Err(err);
        }

        let entry = HandleEntry {
            name: name.parse().map_err(|_| QueueError::InvalidArg)?,
            access,
            mode,
        };
        match handles.reserve(entry) {
            Ok(handle) => {
                info!("open {name} access={access:?} mode={mode:?}");
                Ok(handle)
            }
            Err(err) => {
                let _ = crate::lock::release(&self.port, name, access);
                Err(err)
            }
        }
    }

    /// spec.md 4.4.4.
    pub fn close(&self, handle: QueueHandle) -> Result<(), QueueError> {
        let mut handles = self.handles.lock();
        let entry = handles.validate(handle)?;
        let name = entry.name.clone();
        let access = entry.access;

        if !self.port.exists(name.as_str()) {
            return Err(QueueError::QueueMissing);
        }

        crate::lock::release(&self.port, name.as_str(), access)?;
        let result = handles.release(handle);
        if result.is_ok() {
            info!("close {name}");
        }
        result
    }

    /// spec.md 4.4.5, including both adopted bug-fixes (eviction unlinks the
    /// evicted payload; the new entry's payload is written before it).
    pub fn enqueue(&self, handle: QueueHandle, data: &[u8]) -> Result<(), QueueError> {
        let name = {
            let handles = self.handles.lock();
            let entry = handles.validate(handle)?;
            if !entry.access.can_write() {
                return Err(QueueError::QueueReadOnly);
            }
            entry.name.clone()
        };
        let name = name.as_str();
        debug!("enqueue {name} len={}", data.len());

        if data.is_empty() {
            return Err(QueueError::InvalidArg);
        }
        if !self.port.exists(name) {
            return Err(QueueError::QueueMissing);
        }
        if !crate::lock::writer_lock_present(&self.port, name) {
            return Err(QueueError::QueueClosed);
        }

        let mut header = load_header(&self.port, name)?;
        if data.len() > header.max_entry_size as usize {
            return Err(QueueError::InvalidArg);
        }
        let mut lut = load_lut(&self.port, name, header.max_entries)?;

        header.reference_count = header.reference_count.wrapping_add(1);
        let reference = mint_reference(header.reference_count);
        let reference_name = reference_to_name(&reference);
        let payload_path = entry_path(name, reference_name.as_str());

        let file = self.port.create_exclusive(&payload_path).map_err(to_fs_err)?;
        let write_result = write_all(&self.port, file, data);
        self.port.close(file).map_err(to_fs_err)?;
        write_result?;

        let max_entries = header.max_entries;
        if header.num_of_entries == 0 && header.head_lut_offs == header.tail_lut_offs {
            lut.set_slot(header.tail_lut_offs, reference);
            header.num_of_entries = 1;
        } else if header.num_of_entries == max_entries {
            if header.seek_lut_offs == header.head_lut_offs {
                header.seek_lut_offs = (header.seek_lut_offs + 1) % max_entries;
            }
            let evicted = *lut.slot(header.head_lut_offs);
            lut.clear_slot(header.head_lut_offs);
            let evicted_name = reference_to_name(&evicted);
            let evicted_path = entry_path(name, evicted_name.as_str());
            self.port.unlink(&evicted_path).map_err(to_fs_err)?;
            warn!("enqueue {name}: queue full, evicted oldest entry {evicted_name}");

            header.head_lut_offs = (header.head_lut_offs + 1) % max_entries;
            header.tail_lut_offs = (header.tail_lut_offs + 1) % max_entries;
            lut.set_slot(header.tail_lut_offs, reference);
        } else {
            header.tail_lut_offs = (header.tail_lut_offs + 1) % max_entries;
            lut.set_slot(header.tail_lut_offs, reference);
            header.num_of_entries += 1;
        }

        store_lut(&self.port, name, &lut)?;
        store_header(&self.port, name, &header)
    }

    /// spec.md 4.4.6. Returns the number of bytes written into `out`.
    pub fn dequeue(&self, handle: QueueHandle, out: &mut [u8]) -> Result<usize, QueueError> {
        let name = {
            let handles = self.handles.lock();
            let entry = handles.validate(handle)?;
            if !entry.access.can_write() {
                return Err(QueueError::QueueReadOnly);
            }
            entry.name.clone()
        };
        let name = name.as_str();
        debug!("dequeue {name}");

        if !self.port.exists(name) {
            return Err(QueueError::QueueMissing);
        }
        if !crate::lock::writer_lock_present(&self.port, name) {
            return Err(QueueError::QueueClosed);
        }

        let mut header = load_header(&self.port, name)?;
        let mut lut = load_lut(&self.port, name, header.max_entries)?;

        if header.num_of_entries == 0 {
            return Err(QueueError::QueueIsEmpty);
        }

        let max_entries = header.max_entries;
        if header.seek_lut_offs == header.head_lut_offs {
            header.seek_lut_offs = (header.seek_lut_offs + 1) % max_entries;
        }

        let reference = *lut.slot(header.head_lut_offs);
        let reference_name = reference_to_name(&reference);
        let payload_path = entry_path(name, reference_name.as_str());

        let file = self.port.open(&payload_path, OpenFlags::READ_ONLY).map_err(to_fs_err)?;
        let read_result = read_up_to(&self.port, file, out);
        self.port.close(file).map_err(to_fs_err)?;
        let produced = read_result?;

        self.port.unlink(&payload_path).map_err(to_fs_err)?;

        lut.clear_slot(header.head_lut_offs);
        header.head_lut_offs = (header.head_lut_offs + 1) % max_entries;
        header.num_of_entries -= 1;

        store_lut(&self.port, name, &lut)?;
        store_header(&self.port, name, &header)?;
        Ok(produced)
    }

    /// spec.md 4.4.7.
    pub fn seek(&self, handle: QueueHandle, seek_type: SeekType, position: u8) -> Result<(), QueueError> {
        let name = {
            let handles = self.handles.lock();
            let entry = handles.validate(handle)?;
            if !entry.access.can_read() {
                return Err(QueueError::QueueWriteOnly);
            }
            entry.name.clone()
        };
        let name = name.as_str();
        debug!("seek {name} {seek_type:?} {position}");

        if !self.port.exists(name) {
            return Err(QueueError::QueueMissing);
        }
        if !crate::lock::reader_lock_present(&self.port, name) {
            return Err(QueueError::QueueClosed);
        }

        let mut header = load_header(&self.port, name)?;
        if !header.flags.contains(QueueFlags::RANDOM_ACCESS) {
            return Err(QueueError::QueueNotSeekable);
        }
        if header.num_of_entries == 0 {
            return Err(QueueError::QueueIsEmpty);
        }

        header.seek_lut_offs = match seek_type {
            SeekType::Head => header.head_lut_offs,
            SeekType::Tail => header.tail_lut_offs,
            SeekType::Position => {
                if position >= header.num_of_entries {
                    return Err(QueueError::InvalidSeek);
                }
                let sum = header.head_lut_offs as u16 + position as u16;
                (sum % header.max_entries as u16) as u8
            }
        };

        store_header(&self.port, name, &header)
    }

    /// spec.md 4.4.8. Returns the number of bytes written into `out`.
    pub fn get_entry(&self, handle: QueueHandle, out: &mut [u8]) -> Result<usize, QueueError> {
        let name = {
            let handles = self.handles.lock();
            let entry = handles.validate(handle)?;
            if !entry.access.can_read() {
                return Err(QueueError::QueueWriteOnly);
            }
            entry.name.clone()
        };
        let name = name.as_str();
        debug!("get_entry {name}");

        if !self.port.exists(name) {
            return Err(QueueError::QueueMissing);
        }
        if !crate::lock::reader_lock_present(&self.port, name) {
            return Err(QueueError::QueueClosed);
        }

        let mut header = load_header(&self.port, name)?;
        let lut = load_lut(&self.port, name, header.max_entries)?;

        if header.num_of_entries == 0 {
            return Err(QueueError::QueueIsEmpty);
        }

        let reference = *lut.slot(header.seek_lut_offs);
        let reference_name = reference_to_name(&reference);
        let payload_path = entry_path(name, reference_name.as_str());

        let file = self.port.open(&payload_path, OpenFlags::READ_ONLY).map_err(to_fs_err)?;
        let read_result = read_up_to(&self.port, file, out);
        self.port.close(file).map_err(to_fs_err)?;
        let produced = read_result?;

        if header.seek_lut_offs != header.tail_lut_offs {
            header.seek_lut_offs = (header.seek_lut_offs + 1) % header.max_entries;
        }
        store_header(&self.port, name, &header)?;
        Ok(produced)
    }

    /// spec.md 4.4.9.
    pub fn get_length(&self, handle: QueueHandle) -> Result<u8, QueueError> {
        let name = {
            let handles = self.handles.lock();
            let entry = handles.validate(handle)?;
            entry.name.clone()
        };
        let name = name.as_str();
        debug!("get_length {name}");

        if !self.port.exists(name) {
            return Err(QueueError::QueueMissing);
        }
        if !crate::lock::any_lock_present(&self.port, name) {
            return Err(QueueError::QueueClosed);
        }

        let header = load_header(&self.port, name)?;
        Ok(header.num_of_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashq_abi::QueueFlags;
    use flashq_posix::PosixPort;

    fn engine() -> (tempfile::TempDir, Engine<PosixPort>) {
        let dir = tempfile::tempdir().unwrap();
        let port = PosixPort::new(dir.path());
        (dir, Engine::new(port))
    }

    #[test]
    fn create_enqueue_getlength_dequeue_destroy() {
        let (_dir, engine) = engine();
        engine.create("q", 4, 64, QueueFlags::RANDOM_ACCESS).unwrap();
        let h = engine.open("q", AccessType::ReadWrite, AccessMode::BinaryPacked).unwrap();
        engine.enqueue(h, b"hello").unwrap();
        assert_eq!(engine.get_length(h).unwrap(), 1);

        let mut buf = [0u8; 5];
        let n = engine.dequeue(h, &mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");

        engine.close(h).unwrap();
        engine.destroy("q").unwrap();
        assert!(!engine.port().exists("q"));
    }

    #[test]
    fn overflow_eviction_unlinks_oldest_payload() {
        let (_dir, engine) = engine();
        engine.create("q", 3, 8, QueueFlags::empty()).unwrap();
        let h = engine.open("q", AccessType::ReadWrite, AccessMode::BinaryPacked).unwrap();
        for entry in [b"a".as_slice(), b"b", b"c", b"d"] {
            engine.enqueue(h, entry).unwrap();
        }
        assert_eq!(engine.get_length(h).unwrap(), 3);

        let mut out = [0u8; 8];
        let n = engine.dequeue(h, &mut out).unwrap();
        assert_eq!(&out[..n], b"b");
    }

    #[test]
    fn seek_random_access_scenario() {
        let (_dir, engine) = engine();
        engine.create("q", 4, 8, QueueFlags::RANDOM_ACCESS).unwrap();
        let writer = engine.open("q", AccessType::ReadWrite, AccessMode::BinaryPacked).unwrap();
        engine.enqueue(writer, b"x").unwrap();
        engine.enqueue(writer, b"y").unwrap();
        engine.enqueue(writer, b"z").unwrap();
        engine.close(writer).unwrap();

        let reader = engine.open("q", AccessType::ReadOnly, AccessMode::BinaryPacked).unwrap();
        engine.seek(reader, SeekType::Head, 0).unwrap();
        let mut buf = [0u8; 1];

        let n = engine.get_entry(reader, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"x");
        let n = engine.get_entry(reader, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"y");
        let n = engine.get_entry(reader, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"z");
        let n = engine.get_entry(reader, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"z");

        engine.seek(reader, SeekType::Position, 1).unwrap();
        let n = engine.get_entry(reader, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"y");
    }

    #[test]
    fn non_seekable_without_random_access_flag() {
        let (_dir, engine) = engine();
        engine.create("q", 4, 8, QueueFlags::empty()).unwrap();
        let h = engine.open("q", AccessType::ReadOnly, AccessMode::BinaryPacked).unwrap();
        assert_eq!(
            engine.seek(h, SeekType::Head, 0),
            Err(QueueError::QueueNotSeekable)
        );
    }

    #[test]
    fn cross_process_busy_then_succeeds_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let port_a = PosixPort::new(dir.path());
        let port_b = PosixPort::new(dir.path());
        let engine_a = Engine::new(port_a);
        let engine_b = Engine::new(port_b);

        engine_a.create("q", 4, 8, QueueFlags::empty()).unwrap();
        let a = engine_a
            .open("q", AccessType::ReadWrite, AccessMode::BinaryPacked)
            .unwrap();

        assert_eq!(
            engine_b.open("q", AccessType::ReadOnly, AccessMode::BinaryPacked),
            Err(QueueError::QueueIsBusy)
        );

        engine_a.close(a).unwrap();
        assert!(
            engine_b
                .open("q", AccessType::ReadOnly, AccessMode::BinaryPacked)
                .is_ok()
        );
    }

    #[test]
    fn readonly_sharing_counts_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let port_a = PosixPort::new(dir.path());
        let port_b = PosixPort::new(dir.path());
        let engine_a = Engine::new(port_a);
        let engine_b = Engine::new(port_b);

        engine_a.create("q", 4, 8, QueueFlags::empty()).unwrap();
        let a = engine_a
            .open("q", AccessType::ReadOnly, AccessMode::BinaryPacked)
            .unwrap();
        let b = engine_b
            .open("q", AccessType::ReadOnly, AccessMode::BinaryPacked)
            .unwrap();

        assert!(engine_a.port().exists("q/.rolock"));

        engine_a.close(a).unwrap();
        assert!(engine_a.port().exists("q/.rolock"));
        engine_b.close(b).unwrap();
        assert!(!engine_a.port().exists("q/.rolock"));
    }

    #[test]
    fn reopen_same_queue_same_access_returns_equal_handle() {
        let (_dir, engine) = engine();
        engine.create("q", 4, 8, QueueFlags::empty()).unwrap();
        let h1 = engine.open("q", AccessType::ReadWrite, AccessMode::BinaryPacked).unwrap();
        let h2 = engine.open("q", AccessType::ReadWrite, AccessMode::BinaryPacked).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn destroy_absent_queue_is_ok() {
        let (_dir, engine) = engine();
        assert!(engine.destroy("ghost").is_ok());
    }
}
