//! Tensor registry and disk-offset map.
//!
//! Populated once at model load, then read from the hot path at every op.
//! Reverse lookup by address and by name both need to be O(1) amortized —
//! `dashmap` is the concurrent hash map the rest of the pack reaches for
//! this job (`cognitod::context::ContextStore` uses a locked `HashMap` for
//! its live-process table; we use `dashmap::DashMap` instead since registry
//! lookups happen from the hot, lock-averse op-logging path).

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use tensor_trace_common::{extract_layer_id, TENSOR_IDX_NONE};

/// One registered tensor's metadata.
#[derive(Clone, Debug)]
pub struct RegistryEntry {
    pub data_addr: u64,
    pub name: String,
    pub file_offset: u64,
    pub size_bytes: u64,
    pub layer_id: u16,
    pub tensor_idx: u32,
}

/// Append-only tensor registry with O(1) amortized address lookup.
///
/// `tensor_idx` is assigned in registration order and never changes
/// meaning afterward (invariant 3, spec.md). Bounded by `capacity`; once
/// full, further registrations are dropped with a diagnostic warning
/// rather than aborting.
pub struct TensorRegistry {
    entries: boxcar_like::AppendVec<RegistryEntry>,
    by_addr: DashMap<u64, u32>,
    capacity: usize,
    len: AtomicUsize,
}

impl TensorRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: boxcar_like::AppendVec::with_capacity(capacity),
            by_addr: DashMap::with_capacity(capacity),
            capacity,
            len: AtomicUsize::new(0),
        }
    }

    /// Registers a tensor, assigning it the next dense index. A no-op (with
    /// a logged warning) once `capacity` entries have been registered.
    pub fn register_tensor(&self, name: &str, data_addr: u64, file_offset: u64, size_bytes: u64) {
        let idx = self.len.fetch_add(1, Ordering::SeqCst);
        if idx >= self.capacity {
            log::warn!(
                "tensor registry full ({} entries), dropping registration of '{}'",
                self.capacity,
                name
            );
            self.len.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        let entry = RegistryEntry {
            data_addr,
            name: name.to_string(),
            file_offset,
            size_bytes,
            layer_id: extract_layer_id(name),
            tensor_idx: idx as u32,
        };
        self.by_addr.insert(data_addr, idx as u32);
        self.entries.push(entry);
    }

    /// Reverse lookup: data address to registry index, `TENSOR_IDX_NONE` if
    /// the address was never registered.
    pub fn lookup_idx(&self, data_addr: u64) -> u32 {
        self.by_addr
            .get(&data_addr)
            .map(|r| *r)
            .unwrap_or(TENSOR_IDX_NONE)
    }

    pub fn get(&self, idx: u32) -> Option<RegistryEntry> {
        self.entries.get(idx as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the registry to `path` as
    /// `tensor_idx,tensor_name,data_ptr,file_offset,size_bytes,layer_id`.
    pub fn dump_registry<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut f = File::create(path)?;
        writeln!(f, "tensor_idx,tensor_name,data_ptr,file_offset,size_bytes,layer_id")?;
        for entry in self.entries.iter() {
            writeln!(
                f,
                "{},{},{},{},{},{}",
                entry.tensor_idx,
                entry.name,
                entry.data_addr,
                entry.file_offset,
                entry.size_bytes,
                entry.layer_id
            )?;
        }
        Ok(())
    }
}

/// Side table mapping tensor name to its byte offset within the GGUF file,
/// populated before data addresses exist (the model loader knows offsets
/// before it has mmap'd the weights).
pub struct DiskOffsetMap {
    offsets: DashMap<String, u64>,
    capacity: usize,
}

impl DiskOffsetMap {
    pub fn new(capacity: usize) -> Self {
        Self {
            offsets: DashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn register_disk_offset(&self, name: &str, file_offset: u64) {
        if self.offsets.len() >= self.capacity && !self.offsets.contains_key(name) {
            log::warn!(
                "disk-offset map full ({} entries), dropping offset for '{}'",
                self.capacity,
                name
            );
            return;
        }
        self.offsets.insert(name.to_string(), file_offset);
    }

    /// Zero means "not recorded" per spec.md §4.1.
    pub fn lookup_disk_offset(&self, name: &str) -> u64 {
        self.offsets.get(name).map(|r| *r).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// A minimal append-only, index-stable vector. `dashmap` gives us O(1)
/// address/name lookup; this gives us the "append-only, index never
/// changes meaning" half of invariant 3 without pulling in a dedicated
/// crate for it.
mod boxcar_like {
    use std::sync::RwLock;

    pub struct AppendVec<T> {
        inner: RwLock<Vec<T>>,
    }

    impl<T: Clone> AppendVec<T> {
        pub fn with_capacity(cap: usize) -> Self {
            Self {
                inner: RwLock::new(Vec::with_capacity(cap)),
            }
        }

        pub fn push(&self, value: T) {
            self.inner.write().unwrap().push(value);
        }

        pub fn get(&self, idx: usize) -> Option<T>
        where
            T: Clone,
        {
            self.inner.read().unwrap().get(idx).cloned()
        }

        pub fn len(&self) -> usize {
            self.inner.read().unwrap().len()
        }

        pub fn iter(&self) -> std::vec::IntoIter<T> {
            self.inner.read().unwrap().clone().into_iter()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_trace_common::TENSOR_IDX_NONE;

    #[test]
    fn register_then_lookup_round_trips() {
        let reg = TensorRegistry::new(16);
        reg.register_tensor("blk.5.attn_q.weight", 0x1000, 4096, 65536);
        assert_eq!(reg.lookup_idx(0x1000), 0);
        let entry = reg.get(0).unwrap();
        assert_eq!(entry.name, "blk.5.attn_q.weight");
        assert_eq!(entry.layer_id, 5);
        assert_eq!(entry.file_offset, 4096);
    }

    #[test]
    fn unregistered_address_is_sentinel() {
        let reg = TensorRegistry::new(16);
        assert_eq!(reg.lookup_idx(0xdead), TENSOR_IDX_NONE);
    }

    #[test]
    fn indices_are_assignment_ordered_and_stable() {
        let reg = TensorRegistry::new(16);
        reg.register_tensor("a", 1, 0, 10);
        reg.register_tensor("b", 2, 0, 10);
        reg.register_tensor("c", 3, 0, 10);
        assert_eq!(reg.lookup_idx(1), 0);
        assert_eq!(reg.lookup_idx(2), 1);
        assert_eq!(reg.lookup_idx(3), 2);
    }

    #[test]
    fn capacity_exhaustion_is_a_silent_drop() {
        let reg = TensorRegistry::new(2);
        reg.register_tensor("a", 1, 0, 10);
        reg.register_tensor("b", 2, 0, 10);
        reg.register_tensor("c", 3, 0, 10); // dropped
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup_idx(3), TENSOR_IDX_NONE);
        // existing lookups still work
        assert_eq!(reg.lookup_idx(1), 0);
        assert_eq!(reg.lookup_idx(2), 1);
    }

    #[test]
    fn disk_offset_map_zero_means_unrecorded() {
        let map = DiskOffsetMap::new(16);
        assert_eq!(map.lookup_disk_offset("blk.0.attn_q.weight"), 0);
        map.register_disk_offset("blk.0.attn_q.weight", 8192);
        assert_eq!(map.lookup_disk_offset("blk.0.attn_q.weight"), 8192);
    }

    #[test]
    fn dump_registry_writes_expected_csv() {
        let reg = TensorRegistry::new(16);
        reg.register_tensor("blk.3.ffn_gate.weight", 0x2000, 8192, 2097152);
        let tmp = tempfile::NamedTempFile::new().unwrap();
        reg.dump_registry(tmp.path()).unwrap();
        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "tensor_idx,tensor_name,data_ptr,file_offset,size_bytes,layer_id"
        );
        assert_eq!(lines.next().unwrap(), "0,blk.3.ffn_gate.weight,8192,8192,2097152,3");
    }
}
