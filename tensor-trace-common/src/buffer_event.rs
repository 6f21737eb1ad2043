/// Backend buffer lifecycle event kind.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    Alloc = 0,
    Dealloc = 1,
}

/// A single buffer allocation/deallocation record.
///
/// Exactly 128 bytes, `repr(C, packed)`. Unlike [`crate::OperationRecord`]
/// this struct is never written to disk directly — it is the canonical
/// in-process representation that gets serialized to one JSON line per
/// event (see the buffer-lifecycle logger) — but its width is still a
/// build-time invariant so the two representations can't silently drift
/// apart.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug)]
pub struct BufferEvent {
    /// Nanoseconds since trace start.
    pub timestamp_ns: u64,
    /// Stable id for the buffer, constant across its alloc/dealloc pair.
    pub buffer_id: u64,
    /// Backend memory address at allocation time.
    pub buffer_ptr: u64,
    /// Buffer size in bytes. Meaningless (0) on dealloc.
    pub size_bytes: u64,
    /// Layer id if the buffer is layer-scoped, `LAYER_ID_NONE` otherwise.
    pub layer_id: u16,
    /// 0 = alloc, 1 = dealloc. See [`EventType`].
    pub event_type: u8,
    /// Buffer usage tag: 0 = weights, 1 = compute, 2 = any.
    pub buffer_usage: u8,
    /// Buffer name, NUL-padded, `"unnamed"` (by convention of the caller)
    /// when the host has none.
    pub buffer_name: [u8; 64],
    /// Backend identifier, NUL-padded, e.g. `"CPU"`, `"CUDA0"`.
    pub backend_type: [u8; 16],
    pub _pad: [u8; 12],
}

unsafe impl bytemuck::Zeroable for BufferEvent {}
unsafe impl bytemuck::Pod for BufferEvent {}

impl BufferEvent {
    pub const fn zeroed() -> Self {
        Self {
            timestamp_ns: 0,
            buffer_id: 0,
            buffer_ptr: 0,
            size_bytes: 0,
            layer_id: 0,
            event_type: EventType::Alloc as u8,
            buffer_usage: 0,
            buffer_name: [0; 64],
            backend_type: [0; 16],
            _pad: [0; 12],
        }
    }
}

impl Default for BufferEvent {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn buffer_event_is_128_bytes() {
        assert_eq!(size_of::<BufferEvent>(), 128);
    }

    #[test]
    fn zeroed_is_alloc_by_convention() {
        let ev = BufferEvent::zeroed();
        assert_eq!({ ev.event_type }, EventType::Alloc as u8);
    }
}
