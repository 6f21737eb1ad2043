//! Per-thread ring buffer that batches operation records before committing
//! them into the shared log. Grounded in the same "own your slab, touch the
//! shared structure only at a reservation boundary" shape as
//! `cognitod::runtime::sequencer`, inverted: there the ring is shared and
//! read by one consumer; here the ring is thread-local and written by one
//! producer, committed into a shared sink.

use std::cell::RefCell;

use tensor_trace_common::OperationRecord;

use crate::log_sink::SharedLogSink;

/// Default ring length, chosen so the buffer is about 128 KiB (512 * 256
/// bytes), matching the size spec.md §4.3 calls out. A thread's ring takes
/// its capacity from the first `emit` call on that thread; production
/// callers get this value via `TracerConfig::ring_capacity`'s default.
pub const RING_CAPACITY: usize = 512;

struct Ring {
    records: Vec<OperationRecord>,
    capacity: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, record: OperationRecord, sink: &SharedLogSink) {
        self.records.push(record);
        if self.records.len() >= self.capacity {
            self.flush(sink);
        }
    }

    fn flush(&mut self, sink: &SharedLogSink) {
        if self.records.is_empty() {
            return;
        }
        let bytes = bytemuck::cast_slice(&self.records);
        sink.commit(bytes);
        self.records.clear();
    }
}

thread_local! {
    static RING: RefCell<Option<Ring>> = const { RefCell::new(None) };
}

/// Appends `record` to the calling thread's ring, committing the batch into
/// `sink` if the ring just became full. `ring_capacity` only takes effect on
/// a thread's first call; later calls on the same thread keep whatever
/// capacity the ring was created with.
pub fn emit(record: OperationRecord, sink: &SharedLogSink, ring_capacity: usize) {
    RING.with(|cell| {
        let mut slot = cell.borrow_mut();
        let ring = slot.get_or_insert_with(|| Ring::new(ring_capacity));
        ring.push(record, sink);
    });
}

/// Flushes any non-empty remainder in the calling thread's ring. Threads
/// that exit without calling this lose their unflushed residue — a
/// documented property of the design (spec.md §4.3), not a bug.
pub fn flush_current_thread(sink: &SharedLogSink) {
    RING.with(|cell| {
        if let Some(ring) = cell.borrow_mut().as_mut() {
            ring.flush(sink);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ring_flushes_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SharedLogSink::create(dir.path().join("t.bin"), 1 << 20).unwrap();
        for _ in 0..10 {
            emit(OperationRecord::zeroed(), &sink, RING_CAPACITY);
        }
        assert_eq!(sink.committed_bytes(), 0, "batch shouldn't commit until full or flushed");
        flush_current_thread(&sink);
        assert_eq!(sink.committed_bytes(), 10 * 256);
        // A second flush with nothing pending is a no-op.
        flush_current_thread(&sink);
        assert_eq!(sink.committed_bytes(), 10 * 256);
    }

    #[test]
    fn full_ring_auto_commits() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SharedLogSink::create(dir.path().join("t.bin"), 1 << 20).unwrap();
        for _ in 0..RING_CAPACITY {
            emit(OperationRecord::zeroed(), &sink, RING_CAPACITY);
        }
        assert_eq!(sink.committed_bytes(), (RING_CAPACITY * 256) as u64);
        flush_current_thread(&sink);
        assert_eq!(
            sink.committed_bytes(),
            (RING_CAPACITY * 256) as u64,
            "ring should have been empty already"
        );
    }

    #[test]
    fn small_ring_capacity_commits_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SharedLogSink::create(dir.path().join("t.bin"), 1 << 20).unwrap();
        emit(OperationRecord::zeroed(), &sink, 1);
        assert_eq!(sink.committed_bytes(), 256, "ring of capacity 1 commits immediately");
    }
}
