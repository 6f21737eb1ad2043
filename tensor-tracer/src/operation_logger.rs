//! Assembles one [`OperationRecord`] from a destination tensor and its
//! sources. This is the hot path (spec.md §4.4): no allocation, no I/O.

use tensor_trace_common::{pack_name, OperationRecord, SourceInfo, DST_NAME_LEN, LAYER_ID_NONE, MAX_SOURCES, SOURCE_NAME_LEN};

use crate::provenance::{classify, TensorView};
use crate::registry::{DiskOffsetMap, TensorRegistry};

/// Builds a fully-populated record for `dst`. Does not touch the batcher or
/// shared log — callers wire that up (`Tracer::log_operation`) so this
/// function stays pure and cheaply testable.
pub fn build_record(
    dst: &dyn TensorView,
    timestamp_ns: u64,
    thread_id: u16,
    phase: u8,
    token_id: u32,
    registry: &TensorRegistry,
    disk_offsets: &DiskOffsetMap,
) -> OperationRecord {
    let mut record = OperationRecord::zeroed();
    record.timestamp_ns = timestamp_ns;
    record.token_id = token_id;
    record.thread_id = thread_id;
    record.operation_type = dst.op_kind();
    record.phase = phase;
    record.dst_name = pack_name::<DST_NAME_LEN>(dst.name());
    record.layer_id = tensor_trace_common::extract_layer_id(dst.name());

    let mut num_sources: u8 = 0;
    let mut inherited_layer: Option<u16> = None;

    for i in 0..dst.source_count().min(MAX_SOURCES) {
        let Some(src) = dst.source(i) else {
            break;
        };
        let Some(data_addr) = src.data_addr() else {
            // Unbacked source: skip the slot, don't advance num_sources.
            continue;
        };

        let layer_id = tensor_trace_common::extract_layer_id(src.name());
        if inherited_layer.is_none() {
            inherited_layer = Some(layer_id);
        }

        let provenance = classify(src, disk_offsets);
        let tensor_idx = registry.lookup_idx(data_addr);

        let slot = SourceInfo {
            name: pack_name::<SOURCE_NAME_LEN>(src.name()),
            tensor_ptr: data_addr,
            size_bytes: src.byte_size(),
            layer_id,
            memory_source: provenance.memory_source as u8,
            _pad0: 0,
            disk_offset_or_buffer_id: provenance.disk_offset_or_buffer_id,
            tensor_idx,
            _pad1: 0,
        };
        record.sources[num_sources as usize] = slot;
        num_sources += 1;
    }
    record.num_sources = num_sources;

    if record.layer_id == LAYER_ID_NONE {
        if let Some(layer_id) = inherited_layer {
            if layer_id != LAYER_ID_NONE {
                record.layer_id = layer_id;
            }
        }
    }

    record
}
