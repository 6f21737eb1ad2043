//! Tracer runtime: tensor registry, disk-offset map, provenance classifier,
//! per-thread batcher, shared mmap log sink, operation logger, and the
//! buffer-lifecycle logger, wired together behind the `Tracer` singleton.

pub mod batcher;
pub mod buffer_events;
pub mod config;
pub mod log_sink;
pub mod operation_logger;
pub mod provenance;
pub mod registry;
pub mod time;
pub mod tracer;

pub use buffer_events::BufferEventLogger;
pub use config::TracerConfig;
pub use log_sink::SharedLogSink;
pub use operation_logger::build_record;
pub use provenance::{classify, BufferUsage, BufferView, Provenance, TensorView};
pub use registry::{DiskOffsetMap, RegistryEntry, TensorRegistry};
pub use time::{monotonic_ns, stable_tid, TraceClock};
pub use tracer::{
    dump_registry, log_buffer_alloc, log_buffer_dealloc, log_operation, register_disk_offset,
    register_tensor, set_phase, set_token_id, trace_init, trace_shutdown,
};

pub use tensor_trace_common::Phase;
