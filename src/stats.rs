//! Engine counters and latency tracking.
//!
//! Counters are relaxed atomics, each on its own cache line so the
//! engine thread's updates never contend with reader snapshots. Latency
//! samples go into a bounded ring (oldest overwritten) with running
//! min/max/sum; percentiles are computed on demand by sorting a copy of
//! the populated prefix.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crossbeam_utils::CachePadded;

use crate::time::{now_ns, ns_to_us};
use crate::types::{DurationNs, Timestamp};

/// Summary of recorded latencies, in nanoseconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct LatencyStats {
    pub mean_ns: f64,
    pub median_ns: f64,
    pub p50_ns: f64,
    pub p90_ns: f64,
    pub p95_ns: f64,
    pub p99_ns: f64,
    pub p999_ns: f64,
    pub min_ns: DurationNs,
    pub max_ns: DurationNs,
    pub count: usize,
}

impl fmt::Display for LatencyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Latency Statistics ===")?;
        writeln!(f, "  Samples:  {}", self.count)?;
        writeln!(f, "  Mean:     {:.2} us", ns_to_us(self.mean_ns as DurationNs))?;
        writeln!(f, "  Median:   {:.2} us", ns_to_us(self.median_ns as DurationNs))?;
        writeln!(f, "  P90:      {:.2} us", ns_to_us(self.p90_ns as DurationNs))?;
        writeln!(f, "  P95:      {:.2} us", ns_to_us(self.p95_ns as DurationNs))?;
        writeln!(f, "  P99:      {:.2} us", ns_to_us(self.p99_ns as DurationNs))?;
        writeln!(f, "  P99.9:    {:.2} us", ns_to_us(self.p999_ns as DurationNs))?;
        writeln!(f, "  Min:      {:.2} us", ns_to_us(self.min_ns))?;
        write!(f, "  Max:      {:.2} us", ns_to_us(self.max_ns))
    }
}

struct HistogramState {
    samples: Vec<DurationNs>,
    write_pos: usize,
    count: usize,
    min: DurationNs,
    max: DurationNs,
    sum: i128,
}

/// Bounded ring of latency samples with on-demand percentiles.
pub struct LatencyHistogram {
    state: Mutex<HistogramState>,
    capacity: usize,
}

impl LatencyHistogram {
    pub const DEFAULT_SAMPLE_CAPACITY: usize = 100_000;

    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        Self {
            state: Mutex::new(HistogramState {
                samples: vec![0; capacity],
                write_pos: 0,
                count: 0,
                min: DurationNs::MAX,
                max: 0,
                sum: 0,
            }),
            capacity,
        }
    }

    /// Record one sample, overwriting the oldest when the ring is full.
    pub fn record(&self, latency_ns: DurationNs) {
        let mut state = self.state.lock().unwrap();
        let pos = state.write_pos;
        state.samples[pos] = latency_ns;
        state.write_pos = (pos + 1) % self.capacity;
        state.count += 1;

        state.min = state.min.min(latency_ns);
        state.max = state.max.max(latency_ns);
        state.sum += latency_ns as i128;
    }

    /// Sort the populated prefix and interpolate percentiles.
    pub fn compute_stats(&self) -> LatencyStats {
        let state = self.state.lock().unwrap();
        if state.count == 0 {
            return LatencyStats::default();
        }

        let sample_count = state.count.min(self.capacity);
        let mut sorted = state.samples[..sample_count].to_vec();
        sorted.sort_unstable();

        let percentile = |p: f64| -> f64 {
            let index = (p / 100.0) * (sample_count - 1) as f64;
            let lower = index.floor() as usize;
            let upper = index.ceil() as usize;
            if lower == upper {
                return sorted[lower] as f64;
            }
            let frac = index - lower as f64;
            sorted[lower] as f64 * (1.0 - frac) + sorted[upper] as f64 * frac
        };

        let median = percentile(50.0);
        LatencyStats {
            mean_ns: state.sum as f64 / state.count as f64,
            median_ns: median,
            p50_ns: median,
            p90_ns: percentile(90.0),
            p95_ns: percentile(95.0),
            p99_ns: percentile(99.0),
            p999_ns: percentile(99.9),
            min_ns: state.min,
            max_ns: state.max,
            count: state.count,
        }
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.write_pos = 0;
        state.count = 0;
        state.min = DurationNs::MAX;
        state.max = 0;
        state.sum = 0;
    }

    /// Total samples recorded (may exceed the ring capacity).
    pub fn count(&self) -> usize {
        self.state.lock().unwrap().count
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SAMPLE_CAPACITY)
    }
}

/// Hot counters updated by the engine thread.
pub struct EngineStats {
    pub trade_count: CachePadded<AtomicU64>,
    pub volume: CachePadded<AtomicU64>,
    pub orders_received: CachePadded<AtomicU64>,
    pub orders_accepted: CachePadded<AtomicU64>,
    pub orders_cancelled: CachePadded<AtomicU64>,
    pub orders_modified: CachePadded<AtomicU64>,
    pub rejected_count: CachePadded<AtomicU64>,
    pub filled_qty: CachePadded<AtomicU64>,
    pub latency: LatencyHistogram,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            trade_count: CachePadded::new(AtomicU64::new(0)),
            volume: CachePadded::new(AtomicU64::new(0)),
            orders_received: CachePadded::new(AtomicU64::new(0)),
            orders_accepted: CachePadded::new(AtomicU64::new(0)),
            orders_cancelled: CachePadded::new(AtomicU64::new(0)),
            orders_modified: CachePadded::new(AtomicU64::new(0)),
            rejected_count: CachePadded::new(AtomicU64::new(0)),
            filled_qty: CachePadded::new(AtomicU64::new(0)),
            latency: LatencyHistogram::default(),
        }
    }

    pub fn record_latency(&self, latency_ns: DurationNs) {
        self.latency.record(latency_ns);
    }

    pub fn latency_stats(&self) -> LatencyStats {
        self.latency.compute_stats()
    }

    pub fn reset(&self) {
        self.trade_count.store(0, Ordering::Relaxed);
        self.volume.store(0, Ordering::Relaxed);
        self.orders_received.store(0, Ordering::Relaxed);
        self.orders_accepted.store(0, Ordering::Relaxed);
        self.orders_cancelled.store(0, Ordering::Relaxed);
        self.orders_modified.store(0, Ordering::Relaxed);
        self.rejected_count.store(0, Ordering::Relaxed);
        self.filled_qty.store(0, Ordering::Relaxed);
        self.latency.clear();
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters with computed percentiles.
///
/// Counters are read individually; there is no cross-counter atomicity
/// guarantee while the engine is running.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatsSnapshot {
    pub trade_count: u64,
    pub volume: u64,
    pub orders_received: u64,
    pub orders_accepted: u64,
    pub orders_cancelled: u64,
    pub orders_modified: u64,
    pub rejected_count: u64,
    pub filled_qty: u64,
    pub latency: LatencyStats,
    pub timestamp: Timestamp,
}

impl StatsSnapshot {
    pub fn capture(stats: &EngineStats) -> Self {
        Self {
            trade_count: stats.trade_count.load(Ordering::Relaxed),
            volume: stats.volume.load(Ordering::Relaxed),
            orders_received: stats.orders_received.load(Ordering::Relaxed),
            orders_accepted: stats.orders_accepted.load(Ordering::Relaxed),
            orders_cancelled: stats.orders_cancelled.load(Ordering::Relaxed),
            orders_modified: stats.orders_modified.load(Ordering::Relaxed),
            rejected_count: stats.rejected_count.load(Ordering::Relaxed),
            filled_qty: stats.filled_qty.load(Ordering::Relaxed),
            latency: stats.latency.compute_stats(),
            timestamp: now_ns(),
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Engine Statistics ===")?;
        writeln!(f, "  Trades:       {}", self.trade_count)?;
        writeln!(f, "  Volume:       {}", self.volume)?;
        writeln!(f, "  Orders Recv:  {}", self.orders_received)?;
        writeln!(f, "  Accepted:     {}", self.orders_accepted)?;
        writeln!(f, "  Cancelled:    {}", self.orders_cancelled)?;
        writeln!(f, "  Modified:     {}", self.orders_modified)?;
        writeln!(f, "  Rejected:     {}", self.rejected_count)?;
        writeln!(f, "  Filled Qty:   {}", self.filled_qty)?;
        write!(f, "{}", self.latency)
    }
}
