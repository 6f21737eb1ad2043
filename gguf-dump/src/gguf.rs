//! GGUF header/metadata/tensor-info parsing, grounded directly in
//! `tools/gguf-dump/gguf-dump.cpp`'s minimal self-contained reader: a
//! 24-byte header, a length-prefixed metadata KV block whose values are
//! skipped rather than interpreted, and a tensor-info block that is
//! actually read.

use std::io::Read;

use anyhow::{bail, Context, Result};

use tensor_trace_common::extract_layer_id;

pub const GGUF_MAGIC: u32 = 0x4655_4747;
pub const GGUF_VERSION: u32 = 3;

const MAX_STRING_LEN: u64 = 1024 * 1024;
const MAX_DIMS: u32 = 4;

pub struct Header {
    pub magic: u32,
    pub version: u32,
    pub n_tensors: u64,
    pub n_kv: u64,
}

pub struct TensorInfo {
    pub name: String,
    pub offset: u64,
    pub size_bytes: u64,
    pub layer_id: u16,
    pub component_type: String,
    pub n_dims: u32,
    pub dims: [u64; 4],
}

/// Maps a GGUF tensor-type tag to its per-element byte width. The reference
/// dumper hard-codes F16 (type 1) as 2 bytes and everything else as 4 —
/// spec.md §9 flags this as an open question for quantized types, so it's
/// kept behind a trait rather than a free function to make that table
/// swappable without touching the parser.
pub trait ElementSizeTable {
    fn element_size(&self, tensor_type: u32) -> u64;
}

/// The reference dumper's table: F16 = 2 bytes, everything else (including
/// quantized types, which this undercounts) = 4 bytes.
pub struct SimplifiedElementSizeTable;

impl ElementSizeTable for SimplifiedElementSizeTable {
    fn element_size(&self, tensor_type: u32) -> u64 {
        if tensor_type == 1 {
            2
        } else {
            4
        }
    }
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).context("unexpected EOF reading u32")?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf).context("unexpected EOF reading u64")?;
    Ok(u64::from_le_bytes(buf))
}

fn discard<R: Read>(r: &mut R, n: u64) -> Result<()> {
    let mut remaining = n;
    let mut buf = [0u8; 4096];
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        r.read_exact(&mut buf[..chunk]).context("unexpected EOF skipping value")?;
        remaining -= chunk as u64;
    }
    Ok(())
}

fn read_gguf_string<R: Read>(r: &mut R) -> Result<String> {
    let len = read_u64(r)?;
    if len > MAX_STRING_LEN {
        bail!("string too long ({len} bytes)");
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf).context("unexpected EOF reading string body")?;
    String::from_utf8(buf).context("tensor/KV string is not valid UTF-8")
}

/// Value types 0..12 of the GGUF KV spec. Type 9 (ARRAY) recurses: a
/// `(elem_type: u32, length: u64, elements...)` triple.
fn skip_gguf_value<R: Read>(r: &mut R, value_type: u32) -> Result<()> {
    match value_type {
        0 | 1 => discard(r, 1),             // UINT8 / INT8
        2 | 3 => discard(r, 2),             // UINT16 / INT16
        4 | 5 | 6 => discard(r, 4),         // UINT32 / INT32 / FLOAT32
        7 => discard(r, 1),                 // BOOL
        8 => read_gguf_string(r).map(|_| ()), // STRING
        9 => {
            // ARRAY
            let elem_type = read_u32(r)?;
            let len = read_u64(r)?;
            for _ in 0..len {
                skip_gguf_value(r, elem_type)?;
            }
            Ok(())
        }
        10 | 11 | 12 => discard(r, 8),      // UINT64 / INT64 / FLOAT64
        other => bail!("unknown KV value type {other}"),
    }
}

pub fn read_header<R: Read>(r: &mut R) -> Result<Header> {
    let magic = read_u32(r).context("failed to read header")?;
    let version = read_u32(r).context("failed to read header")?;
    let n_tensors = read_u64(r).context("failed to read header")?;
    let n_kv = read_u64(r).context("failed to read header")?;
    if magic != GGUF_MAGIC {
        bail!("invalid GGUF file (bad magic: {magic:#010x})");
    }
    if version != GGUF_VERSION {
        log::warn!("GGUF version {version} (expected {GGUF_VERSION})");
    }
    Ok(Header {
        magic,
        version,
        n_tensors,
        n_kv,
    })
}

pub fn skip_metadata_kv<R: Read>(r: &mut R, n_kv: u64) -> Result<()> {
    for i in 0..n_kv {
        let _key = read_gguf_string(r).with_context(|| format!("failed to read KV key {i}"))?;
        let value_type = read_u32(r).context("failed to read KV value type")?;
        skip_gguf_value(r, value_type).with_context(|| format!("failed to skip KV value {i}"))?;
    }
    Ok(())
}

pub fn read_tensor_info<R: Read>(r: &mut R, sizes: &dyn ElementSizeTable) -> Result<TensorInfo> {
    let name = read_gguf_string(r).context("failed to read tensor name")?;
    let n_dims = read_u32(r).context("failed to read n_dims")?;
    if n_dims > MAX_DIMS {
        bail!("invalid n_dims {n_dims} (must be <= {MAX_DIMS})");
    }
    let mut dims = [0u64; 4];
    for d in dims.iter_mut().take(n_dims as usize) {
        *d = read_u64(r).context("failed to read tensor dimension")?;
    }
    let tensor_type = read_u32(r).context("failed to read tensor type")?;
    let offset = read_u64(r).context("failed to read tensor offset")?;

    let mut size_bytes = sizes.element_size(tensor_type);
    for d in dims.iter().take(n_dims as usize) {
        size_bytes *= d;
    }

    let layer_id = extract_layer_id(&name);
    let component_type = determine_component_type(&name);

    Ok(TensorInfo {
        name,
        offset,
        size_bytes,
        layer_id,
        component_type,
        n_dims,
        dims,
    })
}

/// Classifies a tensor name into a human-readable component category.
/// First match wins, in this exact order — mirroring
/// `determine_component_type` in `tools/gguf-dump/gguf-dump.cpp` including
/// its quirk that a plain `"output"` substring match (e.g. inside
/// `attn_output`) wins over the more specific `"Attention Output"` case,
/// since that check runs first.
pub fn determine_component_type(name: &str) -> String {
    if name.contains("token_embd") {
        return "Token Embeddings".to_string();
    }
    if name.contains("output") {
        return "Output Projection".to_string();
    }
    if name.contains("attn_q") {
        return "Attention Q".to_string();
    }
    if name.contains("attn_k") {
        return "Attention K".to_string();
    }
    if name.contains("attn_v") {
        return "Attention V".to_string();
    }
    if name.contains("attn_output") {
        return "Attention Output".to_string();
    }
    if name.contains("attn_norm") {
        return "Attention Norm".to_string();
    }
    if name.contains("ffn_up") {
        return "FFN Up".to_string();
    }
    if name.contains("ffn_down") {
        return "FFN Down".to_string();
    }
    if name.contains("ffn_gate") {
        return "FFN Gate".to_string();
    }
    if name.contains("ffn_norm") {
        return "FFN Norm".to_string();
    }
    if name.contains("expert") {
        if let Some(pos) = name.find("expert_") {
            let rest = &name[pos + "expert_".len()..];
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() {
                if let Ok(expert_id) = digits.parse::<i64>() {
                    let prefix = format!("MoE Expert {expert_id}");
                    if name.contains("ffn_up") {
                        return format!("{prefix} Up");
                    }
                    if name.contains("ffn_down") {
                        return format!("{prefix} Down");
                    }
                    if name.contains("ffn_gate") {
                        return format!("{prefix} Gate");
                    }
                }
            }
        }
        return "MoE Expert".to_string();
    }
    "Other".to_string()
}
