//! Shared memory-mapped log: every thread's batcher commits into this via
//! one atomic reservation. Grounded in
//! `cognitod::runtime::sequencer::SequencerConsumer`, which mmaps a BPF
//! ring buffer for zero-copy access; here we mmap a plain file that the
//! tracer itself owns and grows into monotonically rather than wrapping.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{Context, Result};
use memmap2::MmapMut;

/// A single growing, memory-mapped trace file. Reservations are made with
/// an atomic fetch-and-add of `commit_offset`; once full, further
/// reservations are refused and a one-shot warning is logged (spec.md §4.3).
pub struct SharedLogSink {
    mmap: MmapMut,
    _file: File,
    capacity: usize,
    commit_offset: AtomicU64,
    warned_full: AtomicBool,
}

impl SharedLogSink {
    /// Creates/truncates `path` to `capacity` bytes and mmaps it for
    /// writing.
    pub fn create<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("failed to open trace log {:?}", path.as_ref()))?;
        file.set_len(capacity as u64)
            .context("failed to ftruncate trace log to capacity")?;
        // SAFETY: `file` outlives `mmap` (held alongside it in the struct),
        // and nothing else in this process maps the same file.
        let mmap = unsafe { MmapMut::map_mut(&file) }.context("failed to mmap trace log")?;
        Ok(Self {
            mmap,
            _file: file,
            capacity,
            commit_offset: AtomicU64::new(0),
            warned_full: AtomicBool::new(false),
        })
    }

    /// Reserves `bytes` contiguous bytes at the end of the log, returning
    /// the start offset, or `None` if the log is full. Never blocks, never
    /// wraps, never overwrites a prior reservation.
    fn reserve(&self, bytes: usize) -> Option<usize> {
        let start = self.commit_offset.fetch_add(bytes as u64, Ordering::SeqCst) as usize;
        if start.saturating_add(bytes) > self.capacity {
            if !self.warned_full.swap(true, Ordering::SeqCst) {
                log::warn!(
                    "trace log full (capacity {} bytes), dropping batch of {} bytes",
                    self.capacity,
                    bytes
                );
            }
            return None;
        }
        Some(start)
    }

    /// Copies `data` into a freshly reserved region. Returns `false` if the
    /// log was full and the batch was dropped.
    pub fn commit(&self, data: &[u8]) -> bool {
        if data.is_empty() {
            return true;
        }
        let Some(start) = self.reserve(data.len()) else {
            return false;
        };
        // SAFETY: `start..start+data.len()` was exclusively reserved by the
        // fetch_add above; no other thread will write into this range.
        let mmap_ptr = self.mmap.as_ptr() as *mut u8;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mmap_ptr.add(start), data.len());
        }
        true
    }

    /// Flushes the mapping to durable storage.
    pub fn sync(&self) -> Result<()> {
        self.mmap.flush().context("failed to msync trace log")
    }

    pub fn committed_bytes(&self) -> u64 {
        self.commit_offset.load(Ordering::SeqCst).min(self.capacity as u64)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
