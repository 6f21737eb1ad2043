//! Scenario 5: a log sized for exactly four records must drop the rest,
//! leave the first four byte-correct, and warn exactly once. Kept in its own
//! binary so its tiny capacity and ring size don't interact with
//! `full_lifecycle.rs`'s process-wide tracer singleton.

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};

use tensor_tracer::{BufferView, TensorView, TracerConfig};

struct Leaf {
    name: String,
}

impl TensorView for Leaf {
    fn name(&self) -> &str {
        &self.name
    }
    fn data_addr(&self) -> Option<u64> {
        None
    }
    fn byte_size(&self) -> u32 {
        0
    }
    fn op_kind(&self) -> u8 {
        7
    }
    fn source_count(&self) -> usize {
        0
    }
    fn source(&self, _i: usize) -> Option<&dyn TensorView> {
        None
    }
    fn buffer(&self) -> Option<&dyn BufferView> {
        None
    }
}

static WARN_COUNT: AtomicUsize = AtomicUsize::new(0);

struct WarnCounter;

impl log::Log for WarnCounter {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }
    fn log(&self, record: &log::Record) {
        if record.level() == log::Level::Warn {
            WARN_COUNT.fetch_add(1, Ordering::SeqCst);
        }
    }
    fn flush(&self) {}
}

static LOGGER: WarnCounter = WarnCounter;

#[test]
fn overflow_drops_remainder_with_one_warning() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(log::LevelFilter::Warn);

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("trace.bin");
    let events_path = dir.path().join("events.jsonl");

    // Ring capacity 1 so every `log_operation` commits its own record
    // immediately; capacity for exactly 4 records means the 5th commit and
    // every one after it gets refused.
    let config = TracerConfig::new(&log_path, 256 * 4)
        .with_buffer_event_path(&events_path)
        .with_ring_capacity(1);
    tensor_tracer::trace_init(config);

    for i in 0..10 {
        let dst = Leaf {
            name: format!("op{i}"),
        };
        tensor_tracer::log_operation(Some(&dst as &dyn TensorView), 0);
    }
    tensor_tracer::trace_shutdown();

    let mut bytes = Vec::new();
    std::fs::File::open(&log_path).unwrap().read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes.len(), 1024, "file length must stay at capacity, never grow");

    // The first four records must each be present and byte-correct: their
    // `dst_name` field (offset 24 in the 256-byte layout) holds "opN".
    for i in 0..4usize {
        let start = i * 256;
        let dst_name = &bytes[start + 24..start + 24 + 3];
        assert_eq!(dst_name, format!("op{i}").as_bytes());
    }

    assert_eq!(WARN_COUNT.load(Ordering::SeqCst), 1, "exactly one overflow warning expected");
}
