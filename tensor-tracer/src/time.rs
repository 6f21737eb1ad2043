//! Monotonic time and stable per-thread ids.
//!
//! Grounded in `cognitod::runtime::sequencer::SequencerConsumer::get_boot_time_ns`,
//! which reads `CLOCK_BOOTTIME` via `nix::time::clock_gettime`.

use std::cell::Cell;
use std::sync::atomic::{AtomicU16, Ordering};

use nix::time::{clock_gettime, ClockId};

/// Nanoseconds since an arbitrary but monotonic epoch (`CLOCK_MONOTONIC`).
/// Falls back to 0 if the syscall is unavailable — the same "never fatal"
/// posture as the rest of the tracer's platform layer.
pub fn monotonic_ns() -> u64 {
    match clock_gettime(ClockId::CLOCK_MONOTONIC) {
        Ok(ts) => (ts.tv_sec() as u64).saturating_mul(1_000_000_000) + ts.tv_nsec() as u64,
        Err(_) => 0,
    }
}

/// A trace-relative clock: `now()` returns nanoseconds since this clock was
/// constructed, which happens once at `trace_init`.
pub struct TraceClock {
    start_ns: u64,
}

impl TraceClock {
    pub fn start() -> Self {
        Self {
            start_ns: monotonic_ns(),
        }
    }

    /// Nanoseconds elapsed since this clock started. Monotonic non-decreasing
    /// as long as the underlying syscall succeeds; clamped to 0 rather than
    /// going negative if it ever doesn't (e.g. falls back to 0 mid-trace).
    pub fn now_ns(&self) -> u64 {
        monotonic_ns().saturating_sub(self.start_ns)
    }
}

static NEXT_TID: AtomicU16 = AtomicU16::new(1);

thread_local! {
    static TID: Cell<Option<u16>> = const { Cell::new(None) };
}

/// Returns a stable 16-bit id for the calling OS thread, assigning one on
/// first use. IDs are dense and reused only in the sense that two different
/// OS threads never observe the same id concurrently; a 16-bit space wraps
/// after 65535 distinct threads, which is acceptable for a tracing id that
/// only needs to disambiguate *concurrently active* threads (invariant 4,
/// spec.md: used to break timestamp ties across threads).
pub fn stable_tid() -> u16 {
    TID.with(|cell| {
        if let Some(id) = cell.get() {
            return id;
        }
        let id = NEXT_TID.fetch_add(1, Ordering::Relaxed);
        cell.set(Some(id));
        id
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic_non_decreasing() {
        let clock = TraceClock::start();
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }

    #[test]
    fn stable_tid_is_stable_within_a_thread() {
        let first = stable_tid();
        let second = stable_tid();
        assert_eq!(first, second);
    }

    #[test]
    fn stable_tid_differs_across_threads() {
        let main_tid = stable_tid();
        let handle = std::thread::spawn(stable_tid);
        let other_tid = handle.join().unwrap();
        assert_ne!(main_tid, other_tid);
    }
}
