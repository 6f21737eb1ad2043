//! Standalone GGUF structure dumper (spec.md §4.6): reads a GGUF file's
//! header, skips its metadata KV block, and emits a tensor-metadata CSV.

pub mod gguf;

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};

use gguf::{read_header, read_tensor_info, skip_metadata_kv, SimplifiedElementSizeTable, TensorInfo};

/// Parses `path` and writes the tensor-metadata CSV (header line plus one
/// row per tensor, in file order) to `out`. Diagnostics go to stderr, the
/// same split the reference dumper uses between `stdout` (data) and
/// `stderr` (progress/errors).
pub fn run<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let header = read_header(&mut reader)?;
    eprintln!("GGUF file: {}", path.display());
    eprintln!("Tensors: {}", header.n_tensors);
    eprintln!("Metadata KV pairs: {}", header.n_kv);

    skip_metadata_kv(&mut reader, header.n_kv)?;

    let sizes = SimplifiedElementSizeTable;
    let mut tensors = Vec::with_capacity(header.n_tensors as usize);
    for i in 0..header.n_tensors {
        let info = read_tensor_info(&mut reader, &sizes)
            .with_context(|| format!("failed to read tensor info {i}"))?;
        tensors.push(info);
    }

    write_csv(out, &tensors)?;
    eprintln!("\nDumped {} tensors", tensors.len());
    Ok(())
}

fn write_csv<W: Write>(out: &mut W, tensors: &[TensorInfo]) -> Result<()> {
    writeln!(out, "tensor_name,file_offset,size_bytes,layer_id,component_type,n_dims,dim0,dim1,dim2,dim3")?;
    for t in tensors {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{}",
            t.name,
            t.offset,
            t.size_bytes,
            t.layer_id,
            t.component_type,
            t.n_dims,
            t.dims[0],
            t.dims[1],
            t.dims[2],
            t.dims[3],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_string(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    /// Builds a minimal GGUF file: header, zero KV pairs, one tensor
    /// `blk.3.ffn_gate.weight` of shape `[1024, 512]`, type F32, at offset
    /// `0x2000` — this is spec.md §8 scenario 4.
    fn build_scenario_4_file() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&gguf::GGUF_MAGIC.to_le_bytes());
        buf.extend_from_slice(&gguf::GGUF_VERSION.to_le_bytes());
        buf.extend_from_slice(&1u64.to_le_bytes()); // n_tensors
        buf.extend_from_slice(&0u64.to_le_bytes()); // n_kv

        write_string(&mut buf, "blk.3.ffn_gate.weight");
        buf.extend_from_slice(&2u32.to_le_bytes()); // n_dims
        buf.extend_from_slice(&1024u64.to_le_bytes());
        buf.extend_from_slice(&512u64.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes()); // tensor type F32
        buf.extend_from_slice(&0x2000u64.to_le_bytes()); // offset

        buf
    }

    #[test]
    fn scenario_4_produces_the_exact_expected_csv_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.gguf");
        std::fs::File::create(&path).unwrap().write_all(&build_scenario_4_file()).unwrap();

        let mut out = Vec::new();
        run(&path, &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "tensor_name,file_offset,size_bytes,layer_id,component_type,n_dims,dim0,dim1,dim2,dim3"
        );
        assert_eq!(
            lines.next().unwrap(),
            "blk.3.ffn_gate.weight,8192,2097152,3,FFN Gate,2,1024,512,0,0"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.gguf");
        let mut buf = Vec::new();
        buf.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        buf.extend_from_slice(&gguf::GGUF_VERSION.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        std::fs::File::create(&path).unwrap().write_all(&buf).unwrap();

        let mut out = Vec::new();
        assert!(run(&path, &mut out).is_err());
    }

    #[test]
    fn missing_file_is_an_open_failure() {
        let mut out = Vec::new();
        assert!(run(Path::new("/nonexistent/path/to/model.gguf"), &mut out).is_err());
    }

    #[test]
    fn unrecognized_tensor_name_gets_other_and_sentinel_layer() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&gguf::GGUF_MAGIC.to_le_bytes());
        buf.extend_from_slice(&gguf::GGUF_VERSION.to_le_bytes());
        buf.extend_from_slice(&1u64.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        write_string(&mut buf, "rope_freqs");
        buf.extend_from_slice(&0u32.to_le_bytes()); // n_dims 0
        buf.extend_from_slice(&0u32.to_le_bytes()); // tensor type
        buf.extend_from_slice(&0u64.to_le_bytes()); // offset

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.gguf");
        std::fs::File::create(&path).unwrap().write_all(&buf).unwrap();

        let mut out = Vec::new();
        run(&path, &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "rope_freqs,0,4,65535,Other,0,0,0,0,0");
    }

    #[test]
    fn determine_component_type_is_reexported_correctly() {
        assert_eq!(gguf::determine_component_type("output.weight"), "Output Projection");
    }
}
