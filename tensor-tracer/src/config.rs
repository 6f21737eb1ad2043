//! Tracer configuration, constructed by the host and handed to
//! [`crate::tracer::trace_init`]. Loading it from a file or environment is
//! the enabling CLI's job, not the tracer's (spec.md §1) — this is a plain
//! struct with a `Default`, the same shape as `cognitod::config::Config`
//! minus the parsing layer.

use std::path::PathBuf;

use crate::batcher::RING_CAPACITY;

/// Default path for the buffer-lifecycle stream. The reference tracer
/// hard-coded this; spec.md §9 flags that as unresolved and asks for it to
/// become a configuration option instead, which `TracerConfig` does — this
/// constant now only supplies the default.
pub const DEFAULT_BUFFER_EVENT_PATH: &str = "/tmp/buffer_stats.jsonl";

/// Default tensor registry / disk-offset map capacity — generous enough
/// for a multi-billion-parameter dense or MoE checkpoint's tensor count.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 4096;

#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Path to the binary operation-record log.
    pub log_path: PathBuf,
    /// Capacity, in bytes, to truncate and mmap the log file to.
    pub log_capacity_bytes: usize,
    /// Path to the buffer-lifecycle JSON-line stream.
    pub buffer_event_path: PathBuf,
    /// Tensor registry / disk-offset map capacity (entry count).
    pub registry_capacity: usize,
    /// Per-thread ring length. Exposed for tests; production callers should
    /// use the default, which matches spec.md §4.3's sizing rationale.
    pub ring_capacity: usize,
}

impl TracerConfig {
    pub fn new<P: Into<PathBuf>>(log_path: P, log_capacity_bytes: usize) -> Self {
        Self {
            log_path: log_path.into(),
            log_capacity_bytes,
            buffer_event_path: PathBuf::from(DEFAULT_BUFFER_EVENT_PATH),
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            ring_capacity: RING_CAPACITY,
        }
    }

    pub fn with_buffer_event_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.buffer_event_path = path.into();
        self
    }

    pub fn with_registry_capacity(mut self, capacity: usize) -> Self {
        self.registry_capacity = capacity;
        self
    }

    pub fn with_ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_fills_in_documented_defaults() {
        let cfg = TracerConfig::new("/tmp/trace.bin", 1 << 20);
        assert_eq!(cfg.buffer_event_path, PathBuf::from(DEFAULT_BUFFER_EVENT_PATH));
        assert_eq!(cfg.registry_capacity, DEFAULT_REGISTRY_CAPACITY);
        assert_eq!(cfg.ring_capacity, RING_CAPACITY);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let cfg = TracerConfig::new("/tmp/trace.bin", 1 << 20)
            .with_buffer_event_path("/tmp/custom.jsonl")
            .with_registry_capacity(16);
        assert_eq!(cfg.buffer_event_path, PathBuf::from("/tmp/custom.jsonl"));
        assert_eq!(cfg.registry_capacity, 16);
    }
}
