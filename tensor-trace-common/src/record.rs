use crate::{DST_NAME_LEN, MAX_SOURCES, SOURCE_NAME_LEN};

/// Which side of the model's memory a tensor's bytes come from.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemorySource {
    /// Memory-mapped model weights, backed by the GGUF file on disk.
    Disk = 0,
    /// Runtime compute memory: KV cache, scratch, activations.
    Buffer = 1,
}

/// Inference phase an operation was logged during.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Bulk processing of the input prompt.
    Prompt = 0,
    /// Autoregressive token-by-token generation.
    Generate = 1,
}

/// One source tensor referenced by an operation record.
///
/// Exactly 52 bytes, `repr(C, packed)` so the layout never depends on the
/// target's natural alignment. Field order matches the format table: no
/// implicit padding may be inserted between `name` and `tensor_ptr`.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug)]
pub struct SourceInfo {
    /// Truncated tensor name, NUL-terminated if shorter than the buffer.
    pub name: [u8; SOURCE_NAME_LEN],
    /// Data address of the source tensor.
    pub tensor_ptr: u64,
    /// Byte count of the source tensor.
    pub size_bytes: u32,
    /// Parsed transformer layer, `LAYER_ID_NONE` if not applicable.
    pub layer_id: u16,
    /// 0 = disk-backed weights, 1 = runtime buffer. See [`MemorySource`].
    pub memory_source: u8,
    pub _pad0: u8,
    /// Disk byte offset (DISK) or stable buffer id (BUFFER).
    pub disk_offset_or_buffer_id: u64,
    /// Registry index, `TENSOR_IDX_NONE` if unregistered.
    pub tensor_idx: u32,
    pub _pad1: u32,
}

// SAFETY: every field is itself Pod, the struct is repr(C, packed) with no
// interior padding beyond the explicit `_pad*` bytes, and all-zero is a
// valid value for every field.
unsafe impl bytemuck::Zeroable for SourceInfo {}
unsafe impl bytemuck::Pod for SourceInfo {}

impl SourceInfo {
    pub const fn zeroed() -> Self {
        Self {
            name: [0; SOURCE_NAME_LEN],
            tensor_ptr: 0,
            size_bytes: 0,
            layer_id: 0,
            memory_source: 0,
            _pad0: 0,
            disk_offset_or_buffer_id: 0,
            tensor_idx: 0,
            _pad1: 0,
        }
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// One logged tensor operation: a destination tensor and up to four
/// sources. Exactly 256 bytes (four cache lines), `repr(C, packed)`.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug)]
pub struct OperationRecord {
    /// Nanoseconds since trace start.
    pub timestamp_ns: u64,
    /// Token currently being processed.
    pub token_id: u32,
    /// Op's layer id (from the destination, else inherited from source 0).
    pub layer_id: u16,
    /// Stable 16-bit id of the logging OS thread.
    pub thread_id: u16,
    /// Op-kind tag, meaning defined by the host runtime.
    pub operation_type: u8,
    /// 0 = prompt, 1 = generate. See [`Phase`].
    pub phase: u8,
    /// Number of populated entries in `sources`, 0..=4.
    pub num_sources: u8,
    pub _pad: [u8; 5],
    /// Destination tensor name, truncated and NUL-padded.
    pub dst_name: [u8; DST_NAME_LEN],
    /// Up to four source-tensor slots; unused slots are zero-filled.
    pub sources: [SourceInfo; MAX_SOURCES],
}

unsafe impl bytemuck::Zeroable for OperationRecord {}
unsafe impl bytemuck::Pod for OperationRecord {}

impl OperationRecord {
    pub const fn zeroed() -> Self {
        Self {
            timestamp_ns: 0,
            token_id: 0,
            layer_id: 0,
            thread_id: 0,
            operation_type: 0,
            phase: 0,
            num_sources: 0,
            _pad: [0; 5],
            dst_name: [0; DST_NAME_LEN],
            sources: [SourceInfo::zeroed(); MAX_SOURCES],
        }
    }
}

impl Default for OperationRecord {
    fn default() -> Self {
        Self::zeroed()
    }
}
