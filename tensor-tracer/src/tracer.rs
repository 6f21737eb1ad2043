//! The tracer singleton and its driver contract (spec.md §6, §9).
//!
//! Process-global mutable state is unavoidable here — the tracer is called
//! from inside a runtime it doesn't control and can't thread a handle
//! through. Per spec.md §9 it's modeled as one object built by
//! [`trace_init`], stored behind a `once_cell::sync::OnceCell`, with every
//! operation short-circuiting to a no-op when the cell is empty or the
//! tracer has been shut down. `cognitod::context::ContextStore` is built the
//! same way: a single process-wide store other modules reach through free
//! functions rather than threading a reference everywhere.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use once_cell::sync::OnceCell;

use tensor_trace_common::Phase;

use crate::batcher;
use crate::buffer_events::BufferEventLogger;
use crate::config::TracerConfig;
use crate::log_sink::SharedLogSink;
use crate::operation_logger::build_record;
use crate::provenance::BufferUsage;
use crate::registry::{DiskOffsetMap, TensorRegistry};
use crate::time::{stable_tid, TraceClock};
use crate::provenance::TensorView;

static TRACER: OnceCell<Tracer> = OnceCell::new();

struct Tracer {
    clock: TraceClock,
    sink: SharedLogSink,
    buffer_log: BufferEventLogger,
    registry: TensorRegistry,
    disk_offsets: DiskOffsetMap,
    ring_capacity: usize,
    phase: AtomicU8,
    token_id: AtomicU32,
    active: AtomicBool,
}

impl Tracer {
    fn new(config: TracerConfig) -> anyhow::Result<Self> {
        let sink = SharedLogSink::create(&config.log_path, config.log_capacity_bytes)?;
        let buffer_log = BufferEventLogger::create(&config.buffer_event_path)?;
        Ok(Self {
            clock: TraceClock::start(),
            sink,
            buffer_log,
            registry: TensorRegistry::new(config.registry_capacity),
            disk_offsets: DiskOffsetMap::new(config.registry_capacity),
            ring_capacity: config.ring_capacity,
            phase: AtomicU8::new(Phase::Prompt as u8),
            token_id: AtomicU32::new(0),
            active: AtomicBool::new(true),
        })
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Initializes the tracer singleton. A no-op (with a logged diagnostic) if
/// already initialized — double init is a configuration error per
/// spec.md §7, never fatal. Failures to open/truncate/mmap the underlying
/// files are likewise logged and leave the tracer uninitialized, so every
/// later call becomes a silent no-op.
pub fn trace_init(config: TracerConfig) {
    if TRACER.get().is_some() {
        log::error!("trace_init called more than once; ignoring");
        return;
    }
    match Tracer::new(config) {
        Ok(tracer) => {
            if TRACER.set(tracer).is_err() {
                log::error!("concurrent trace_init lost the race; ignoring this call");
            }
        }
        Err(e) => log::error!("failed to initialize tracer: {e:#}"),
    }
}

/// Flushes the calling thread's ring, syncs the log, and marks the tracer
/// inactive. Idempotent: only the first call does any work.
pub fn trace_shutdown() {
    let Some(tracer) = TRACER.get() else { return };
    if !tracer.active.swap(false, Ordering::AcqRel) {
        return;
    }
    batcher::flush_current_thread(&tracer.sink);
    if let Err(e) = tracer.sink.sync() {
        log::error!("failed to sync trace log on shutdown: {e:#}");
    }
}

pub fn register_tensor(name: &str, data_addr: u64, file_offset: u64, size_bytes: u64) {
    let Some(tracer) = TRACER.get() else { return };
    tracer.registry.register_tensor(name, data_addr, file_offset, size_bytes);
}

pub fn register_disk_offset(name: &str, file_offset: u64) {
    let Some(tracer) = TRACER.get() else { return };
    tracer.disk_offsets.register_disk_offset(name, file_offset);
}

/// Updates the process-wide phase read by [`log_operation`]. Relaxed: a
/// one-op skew against the driver's call is acceptable (spec.md §5).
pub fn set_phase(phase: Phase) {
    let Some(tracer) = TRACER.get() else { return };
    tracer.phase.store(phase as u8, Ordering::Relaxed);
}

pub fn set_token_id(token_id: u32) {
    let Some(tracer) = TRACER.get() else { return };
    tracer.token_id.store(token_id, Ordering::Relaxed);
}

/// The single entry point invoked by the op dispatcher (spec.md §4.4).
/// `dst` is `None` when the dispatcher has no destination tensor to report,
/// which ends the call the same way an uninitialized tracer or a non-lead
/// `worker_index` does.
pub fn log_operation(dst: Option<&dyn TensorView>, worker_index: u32) {
    let Some(tracer) = TRACER.get() else { return };
    if !tracer.is_active() || worker_index != 0 {
        return;
    }
    let Some(dst) = dst else { return };

    let timestamp_ns = tracer.clock.now_ns();
    let record = build_record(
        dst,
        timestamp_ns,
        stable_tid(),
        tracer.phase.load(Ordering::Relaxed),
        tracer.token_id.load(Ordering::Relaxed),
        &tracer.registry,
        &tracer.disk_offsets,
    );
    batcher::emit(record, &tracer.sink, tracer.ring_capacity);
}

#[allow(clippy::too_many_arguments)]
pub fn log_buffer_alloc(
    buffer_id: u64,
    buffer_ptr: u64,
    size: u64,
    name: Option<&str>,
    backend: Option<&str>,
    usage: BufferUsage,
    layer_id: u16,
) {
    let Some(tracer) = TRACER.get() else { return };
    if !tracer.is_active() {
        return;
    }
    let timestamp_ns = tracer.clock.now_ns();
    tracer
        .buffer_log
        .log_alloc(timestamp_ns, buffer_id, buffer_ptr, size, name, backend, usage, layer_id);
}

pub fn log_buffer_dealloc(buffer_id: u64) {
    let Some(tracer) = TRACER.get() else { return };
    if !tracer.is_active() {
        return;
    }
    let timestamp_ns = tracer.clock.now_ns();
    tracer.buffer_log.log_dealloc(timestamp_ns, buffer_id);
}

pub fn dump_registry<P: AsRef<std::path::Path>>(path: P) {
    let Some(tracer) = TRACER.get() else { return };
    if let Err(e) = tracer.registry.dump_registry(path) {
        log::error!("failed to dump tensor registry: {e}");
    }
}
