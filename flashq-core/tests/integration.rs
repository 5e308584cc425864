//! End-to-end tests against a real filesystem (spec.md 8's round-trip laws
//! and concrete scenarios), run through [`flashq_posix::PosixPort`] +
//! `tempfile`. Lives in `tests/` rather than `src/`'s `#[cfg(test)]`
//! modules because it needs `std` unconditionally and exercises the crate
//! only through its public API, the same split the teacher draws between
//! `fs/src/tests.rs` unit coverage and its `tests/` integration suite.

use flashq_abi::{AccessMode, AccessType, QueueError, QueueFlags, SeekType};
use flashq_core::Engine;
use flashq_posix::PosixPort;

fn engine(dir: &std::path::Path) -> Engine<PosixPort> {
    Engine::new(PosixPort::new(dir))
}

#[test]
fn destroy_on_absent_queue_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    assert_eq!(engine.destroy("never-created"), Ok(()));
}

#[test]
fn destroy_while_open_in_this_process_is_busy() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    engine.create("q", 4, 64, QueueFlags::empty()).unwrap();
    let h = engine
        .open("q", AccessType::ReadWrite, AccessMode::BinaryPacked)
        .unwrap();

    assert_eq!(engine.destroy("q"), Err(QueueError::QueueIsBusy));

    engine.close(h).unwrap();
    assert_eq!(engine.destroy("q"), Ok(()));
}

#[test]
fn enqueue_k_then_dequeue_all_preserves_order_and_clears_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    engine.create("q", 5, 32, QueueFlags::empty()).unwrap();
    let h = engine
        .open("q", AccessType::ReadWrite, AccessMode::BinaryPacked)
        .unwrap();

    let items: [&[u8]; 3] = [b"first", b"second", b"third"];
    for item in items {
        engine.enqueue(h, item).unwrap();
    }

    let mut buf = [0u8; 32];
    for expected in items {
        let n = engine.dequeue(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], expected);
    }
    assert_eq!(engine.get_length(h).unwrap(), 0);
    assert_eq!(engine.dequeue(h, &mut buf), Err(QueueError::QueueIsEmpty));

    engine.close(h).unwrap();
    engine.destroy("q").unwrap();
}

#[test]
fn get_entry_does_not_delete_the_payload_file() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    engine.create("q", 4, 32, QueueFlags::RANDOM_ACCESS).unwrap();
    let writer = engine
        .open("q", AccessType::ReadWrite, AccessMode::BinaryPacked)
        .unwrap();
    engine.enqueue(writer, b"payload").unwrap();
    engine.close(writer).unwrap();

    let reader = engine
        .open("q", AccessType::ReadOnly, AccessMode::BinaryPacked)
        .unwrap();
    engine.seek(reader, SeekType::Head, 0).unwrap();
    let mut buf = [0u8; 32];
    let n = engine.get_entry(reader, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"payload");
    assert_eq!(engine.get_length(reader).unwrap(), 1);

    // The entry must still be there: a second GetEntry at the same
    // position (tail) returns the same bytes rather than an empty queue.
    let n = engine.get_entry(reader, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"payload");
}

#[test]
fn state_survives_across_fresh_engine_instances() {
    let dir = tempfile::tempdir().unwrap();
    {
        let engine = engine(dir.path());
        engine.create("q", 4, 32, QueueFlags::empty()).unwrap();
        let h = engine
            .open("q", AccessType::ReadWrite, AccessMode::BinaryPacked)
            .unwrap();
        engine.enqueue(h, b"durable").unwrap();
        engine.close(h).unwrap();
    }

    // A brand new Engine (fresh handle table, fresh port) over the same
    // directory must see exactly what the first instance persisted.
    let engine = engine(dir.path());
    let h = engine
        .open("q", AccessType::ReadWrite, AccessMode::BinaryPacked)
        .unwrap();
    assert_eq!(engine.get_length(h).unwrap(), 1);
    let mut buf = [0u8; 32];
    let n = engine.dequeue(h, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"durable");
}

#[test]
fn create_rejects_zero_capacity_or_zero_entry_size() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    assert_eq!(
        engine.create("q", 0, 32, QueueFlags::empty()),
        Err(QueueError::InvalidArg)
    );
    assert_eq!(
        engine.create("q", 4, 0, QueueFlags::empty()),
        Err(QueueError::InvalidArg)
    );
}

#[test]
fn enqueue_rejects_oversized_payload() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    engine.create("q", 4, 4, QueueFlags::empty()).unwrap();
    let h = engine
        .open("q", AccessType::ReadWrite, AccessMode::BinaryPacked)
        .unwrap();
    assert_eq!(
        engine.enqueue(h, b"too long"),
        Err(QueueError::InvalidArg)
    );
}

#[test]
fn dequeue_on_a_readonly_handle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    engine.create("q", 4, 32, QueueFlags::empty()).unwrap();
    let h = engine
        .open("q", AccessType::ReadOnly, AccessMode::BinaryPacked)
        .unwrap();
    assert_eq!(engine.dequeue(h, &mut [0u8; 4]), Err(QueueError::QueueReadOnly));
}
