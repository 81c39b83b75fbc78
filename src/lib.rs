//! # tickmill
//!
//! A multithreaded limit-order-book exchange simulator.
//!
//! ## Architecture
//!
//! ```text
//! [Trader Thread] --> [SPSC Semaphore Queue] --> [Engine Thread]
//!                                                      |
//!                                     [Order Book + Accounts + Stats]
//! ```
//!
//! One producer generates order events, one consumer (the matching
//! engine) applies them to a price-time-priority book, settles trades
//! against trader accounts, and records per-event latency.
//!
//! ## Design notes
//!
//! - **No busy-waiting**: the queue blocks on counting semaphores; the
//!   engine polls with a timeout so its stop signal is honored.
//! - **No hot-path allocation**: orders live in a fixed pool indexed by
//!   32-bit handles; price-level FIFOs are intrusive lists over those
//!   handles.
//! - **Single-writer book**: one mutex guards the book; the engine is
//!   the only mutator in normal operation.

pub mod accounts;
pub mod engine;
pub mod events;
pub mod logging;
pub mod order_book;
pub mod pinning;
pub mod pool;
pub mod price_level;
pub mod queue;
pub mod replay;
pub mod risk;
pub mod stats;
pub mod time;
pub mod trader;
pub mod types;

// Re-exports for convenience
pub use accounts::{Account, Accounts};
pub use engine::{EngineConfig, MatchingEngine};
pub use events::{OrderEvent, OrderResponse, Trade};
pub use logging::RingLogger;
pub use order_book::OrderBook;
pub use pool::{Order, OrderPool};
pub use price_level::PriceLevel;
pub use queue::{channel, Consumer, Producer};
pub use risk::{RiskChecker, RiskConfig, RiskResult};
pub use stats::{EngineStats, LatencyHistogram, LatencyStats, StatsSnapshot};
pub use trader::{Trader, TraderConfig};
pub use types::{
    EventKind, OrderHandle, OrderId, OrderResult, Price, Qty, Side, Timestamp, TraderId,
    NIL_HANDLE,
};
