//! Wire format shared by the tracer runtime and the offline GGUF dumper.
//!
//! Every record here is `#[repr(C, packed)]` with an explicit byte layout:
//! field order and padding are chosen to match the widths in the format
//! spec exactly, so the struct's size never depends on the target's
//! natural alignment rules. Readers on disk depend on these offsets.

mod buffer_event;
mod layer;
mod record;

pub use buffer_event::{BufferEvent, EventType};
pub use layer::extract_layer_id;
pub use record::{MemorySource, OperationRecord, Phase, SourceInfo};

/// Sentinel meaning "no layer" for a 16-bit layer id field.
pub const LAYER_ID_NONE: u16 = u16::MAX;

/// Sentinel meaning "not in the registry" for a 32-bit tensor index.
pub const TENSOR_IDX_NONE: u32 = u32::MAX;

/// Maximum number of source tensors recorded per operation.
pub const MAX_SOURCES: usize = 4;

/// Width, in bytes, of a truncated tensor name as stored in [`SourceInfo`].
pub const SOURCE_NAME_LEN: usize = 20;

/// Width, in bytes, of a truncated tensor name as stored in
/// [`OperationRecord::dst_name`].
pub const DST_NAME_LEN: usize = 24;

/// Copies `name` into a fixed-size NUL-padded byte buffer, truncating if
/// necessary. The terminating NUL is always preserved: a name that exactly
/// fills the buffer is truncated by one byte so the last byte stays zero.
pub fn pack_name<const N: usize>(name: &str) -> [u8; N] {
    let mut buf = [0u8; N];
    let bytes = name.as_bytes();
    let copy_len = bytes.len().min(N - 1);
    buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
    buf
}

/// Reads a NUL-padded byte buffer back into a `String`, stopping at the
/// first NUL or the end of the buffer, whichever comes first. Invalid UTF-8
/// is replaced lossily rather than treated as an error — this is
/// diagnostic-path code, not the hot path.
pub fn unpack_name(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_name_truncates_and_nul_terminates() {
        let packed: [u8; 8] = pack_name("blk.5.attn_q.weight");
        assert_eq!(packed.len(), 8);
        assert_eq!(packed[7], 0, "last byte must stay NUL after truncation");
        assert_eq!(unpack_name(&packed), "blk.5.a");
    }

    #[test]
    fn pack_name_short_is_nul_padded() {
        let packed: [u8; 8] = pack_name("abc");
        assert_eq!(&packed, b"abc\0\0\0\0\0");
        assert_eq!(unpack_name(&packed), "abc");
    }

    #[test]
    fn pack_name_exact_fit_drops_last_char() {
        // "abcdefg" is 7 chars; an 8-byte buffer can only hold 7 content
        // bytes + NUL, so an 8-char name must lose its last character.
        let packed: [u8; 8] = pack_name("abcdefgh");
        assert_eq!(unpack_name(&packed), "abcdefg");
    }
}
