//! Memory-provenance classifier and the host-facing tensor/buffer seam.
//!
//! The real op dispatcher and its tensor/buffer types are out of scope
//! (spec.md §1); what the tracer needs from them is captured here as two
//! small traits the host implements for its own types, the same way
//! `cognitod` consumes `ProcessEvent`/`K8sMetadata` as data it doesn't
//! produce.

use tensor_trace_common::MemorySource;

use crate::registry::DiskOffsetMap;

/// Usage tag carried by a backend buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    /// Memory-mapped model parameters.
    Weights,
    /// KV-cache, scratch, activations.
    Compute,
    /// Backend doesn't distinguish; treated like `Compute` for provenance.
    Any,
}

/// A backend buffer, as seen by the classifier.
pub trait BufferView {
    fn usage(&self) -> BufferUsage;
    /// Opaque, stable identifier for this buffer (its backend address).
    fn addr(&self) -> u64;
}

/// A tensor, as seen by the operation logger. Implemented by the host
/// runtime for its real tensor type; the tracer only ever borrows `&dyn
/// TensorView`, never owns or allocates one.
pub trait TensorView {
    fn name(&self) -> &str;
    /// `None` means the tensor has no backing memory yet.
    fn data_addr(&self) -> Option<u64>;
    fn byte_size(&self) -> u32;
    /// Op-kind tag, meaning defined by the host.
    fn op_kind(&self) -> u8;
    fn source_count(&self) -> usize;
    /// `None` ends iteration early (spec.md §4.4 step 5: "if absent, stop").
    fn source(&self, i: usize) -> Option<&dyn TensorView>;
    fn buffer(&self) -> Option<&dyn BufferView>;
}

/// Result of classifying one tensor's memory provenance.
pub struct Provenance {
    pub memory_source: MemorySource,
    pub disk_offset_or_buffer_id: u64,
}

/// Classifies a tensor's memory provenance per spec.md §4.2:
/// - no buffer -> `Buffer` (default, safe)
/// - `Weights` usage -> `Disk`, offset from the disk-offset map (0 if absent)
/// - otherwise -> `Buffer`, id is the buffer's own address
pub fn classify(tensor: &dyn TensorView, disk_offsets: &DiskOffsetMap) -> Provenance {
    match tensor.buffer() {
        None => Provenance {
            memory_source: MemorySource::Buffer,
            disk_offset_or_buffer_id: 0,
        },
        Some(buf) => match buf.usage() {
            BufferUsage::Weights => Provenance {
                memory_source: MemorySource::Disk,
                disk_offset_or_buffer_id: disk_offsets.lookup_disk_offset(tensor.name()),
            },
            BufferUsage::Compute | BufferUsage::Any => Provenance {
                memory_source: MemorySource::Buffer,
                disk_offset_or_buffer_id: buf.addr(),
            },
        },
    }
}
