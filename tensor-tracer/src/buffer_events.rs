//! Buffer-lifecycle logger: one JSON line per alloc/dealloc, flushed
//! immediately so a crash doesn't lose lifecycle context (spec.md §4.5).
//! This is the one part of the tracer that does synchronous I/O, serialized
//! the way `cognitod`'s alert/insight sinks serialize file writes — a
//! `Mutex`-guarded writer, not the lock-free hot path used elsewhere.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde_json::json;
use tensor_trace_common::LAYER_ID_NONE;

use crate::provenance::BufferUsage;

pub struct BufferEventLogger {
    writer: Mutex<File>,
}

impl BufferEventLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open buffer-event log {:?}", path.as_ref()))?;
        Ok(Self {
            writer: Mutex::new(file),
        })
    }

    /// Appends one alloc line. `name`/`backend` fall back to
    /// `"unnamed"`/`"unknown"` when absent.
    pub fn log_alloc(
        &self,
        timestamp_ns: u64,
        buffer_id: u64,
        buffer_ptr: u64,
        size: u64,
        name: Option<&str>,
        backend: Option<&str>,
        usage: BufferUsage,
        layer_id: u16,
    ) {
        let line = json!({
            "timestamp_ms": timestamp_ns as f64 / 1_000_000.0,
            "event": "alloc",
            "buffer_id": buffer_id,
            "buffer_ptr": buffer_ptr,
            "size": size,
            "name": name.unwrap_or("unnamed"),
            "backend": backend.unwrap_or("unknown"),
            "usage": usage_code(usage),
            "layer": layer_field(layer_id),
        });
        self.write_line(&line.to_string());
    }

    pub fn log_dealloc(&self, timestamp_ns: u64, buffer_id: u64) {
        let line = json!({
            "timestamp_ms": timestamp_ns as f64 / 1_000_000.0,
            "event": "dealloc",
            "buffer_id": buffer_id,
        });
        self.write_line(&line.to_string());
    }

    fn write_line(&self, line: &str) {
        let mut f = match self.writer.lock() {
            Ok(f) => f,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(f, "{line}") {
            log::error!("failed to write buffer-event line: {e}");
            return;
        }
        if let Err(e) = f.flush() {
            log::error!("failed to flush buffer-event log: {e}");
        }
    }
}

fn usage_code(usage: BufferUsage) -> u8 {
    match usage {
        BufferUsage::Weights => 0,
        BufferUsage::Compute => 1,
        BufferUsage::Any => 2,
    }
}

fn layer_field(layer_id: u16) -> serde_json::Value {
    if layer_id == LAYER_ID_NONE {
        json!(LAYER_ID_NONE)
    } else {
        json!(layer_id)
    }
}
