//! Monotonic nanosecond clock shared by all threads.
//!
//! Timestamps are nanoseconds elapsed since the first call in the
//! process, so enqueue-to-completion latencies can be computed across
//! threads without worrying about wall-clock adjustments.

use std::time::Instant;

use once_cell::sync::Lazy;

use crate::types::{DurationNs, Timestamp};

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Current timestamp in nanoseconds since process start.
#[inline]
pub fn now_ns() -> Timestamp {
    EPOCH.elapsed().as_nanos() as Timestamp
}

/// Nanoseconds elapsed since `start`.
#[inline]
pub fn elapsed_ns(start: Timestamp) -> DurationNs {
    now_ns().wrapping_sub(start) as DurationNs
}

/// Convert nanoseconds to microseconds.
#[inline]
pub fn ns_to_us(ns: DurationNs) -> f64 {
    ns as f64 / 1_000.0
}

/// Convert nanoseconds to milliseconds.
#[inline]
pub fn ns_to_ms(ns: DurationNs) -> f64 {
    ns as f64 / 1_000_000.0
}
