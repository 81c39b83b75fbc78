//! The matching engine: single consumer of the event queue.
//!
//! Owns the book, accounts, risk checker and statistics. The run loop
//! polls the queue with a 10 ms timeout so a cooperative stop signal is
//! observed promptly, and drains whatever is still enqueued before
//! returning. The trade sink installed on the book settles every trade
//! against the accounts ledger and bumps the trade counters.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::accounts::Accounts;
use crate::events::OrderEvent;
use crate::logging::RingLogger;
use crate::order_book::OrderBook;
use crate::pinning;
use crate::queue::Consumer;
use crate::risk::{RiskChecker, RiskConfig, RiskResult};
use crate::stats::{EngineStats, StatsSnapshot};
use crate::time::now_ns;
use crate::types::{
    DurationNs, EventKind, OrderResult, Timestamp, DEFAULT_MAX_ORDERS, DEFAULT_MAX_PRICE_LEVELS,
};

/// How long one queue poll may block before the stop flag is re-checked.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Engine construction parameters.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub max_orders: u32,
    pub max_price_levels: usize,
    pub max_traders: usize,
    /// Balance granted to accounts created lazily on first contact.
    pub initial_balance: i64,
    pub risk: RiskConfig,
    pub pin_to_core: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_orders: DEFAULT_MAX_ORDERS,
            max_price_levels: DEFAULT_MAX_PRICE_LEVELS,
            max_traders: 1000,
            initial_balance: 1_000_000_000,
            risk: RiskConfig::default(),
            pin_to_core: None,
        }
    }
}

/// Consumer side of the pipeline; see the module docs.
pub struct MatchingEngine {
    consumer: Consumer<OrderEvent>,
    book: OrderBook,
    accounts: Arc<Accounts>,
    risk: RiskChecker,
    stats: Arc<EngineStats>,
    logger: Option<Arc<RingLogger>>,
    config: EngineConfig,
    events_processed: AtomicU64,
    running: AtomicBool,
}

impl MatchingEngine {
    pub fn new(
        consumer: Consumer<OrderEvent>,
        config: EngineConfig,
        logger: Option<Arc<RingLogger>>,
    ) -> Self {
        let book = OrderBook::new(config.max_orders, config.max_price_levels);
        let accounts = Arc::new(Accounts::new(config.max_traders));
        let stats = Arc::new(EngineStats::new());

        let sink_accounts = Arc::clone(&accounts);
        let sink_stats = Arc::clone(&stats);
        let sink_logger = logger.clone();
        book.set_trade_sink(move |trade| {
            sink_accounts.apply_trade(
                trade.maker_trader_id,
                trade.taker_trader_id,
                trade.taker_side,
                trade.price,
                trade.qty,
            );
            sink_stats.trade_count.fetch_add(1, Ordering::Relaxed);
            sink_stats.volume.fetch_add(trade.qty.0 as u64, Ordering::Relaxed);
            if let Some(log) = &sink_logger {
                log.log(format_args!(
                    "trade: {} @ {} maker={} taker={}",
                    trade.qty, trade.price, trade.maker_trader_id, trade.taker_trader_id
                ));
            }
        });

        Self {
            consumer,
            book,
            accounts,
            risk: RiskChecker::new(config.risk),
            stats,
            logger,
            config,
            events_processed: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    /// Consume events until `stop` is raised, then drain the queue and
    /// return.
    pub fn run(&mut self, stop: &AtomicBool) {
        self.running.store(true, Ordering::Release);

        if let Some(core) = self.config.pin_to_core {
            if !pinning::pin_to_core(core) {
                if let Some(log) = &self.logger {
                    log.log(format_args!("failed to pin engine thread to core {core}"));
                }
            }
        }

        while !stop.load(Ordering::Acquire) {
            let Some(event) = self.consumer.try_pop_for(POLL_INTERVAL) else {
                continue;
            };
            self.process_event(&event);
        }

        while let Some(event) = self.consumer.try_pop() {
            self.process_event(&event);
        }

        self.running.store(false, Ordering::Release);
    }

    /// Apply one event to the book. Exposed for tests and the replay
    /// and latency tools.
    pub fn process_event(&mut self, event: &OrderEvent) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        self.stats.orders_received.fetch_add(1, Ordering::Relaxed);

        if event.kind != EventKind::Cancel {
            self.accounts
                .get_or_create(event.trader_id, self.config.initial_balance);
        }

        let risk_result = self.risk.check(event, &self.accounts);
        if risk_result != RiskResult::Passed {
            self.stats.rejected_count.fetch_add(1, Ordering::Relaxed);
            if let Some(log) = &self.logger {
                log.log(format_args!(
                    "rejected order {} reason: {}",
                    event.order_id, risk_result
                ));
            }
            self.record_latency(event.enqueue_time);
            return;
        }

        let response = match event.kind {
            EventKind::NewLimit => self.book.add_limit(
                event.order_id,
                event.trader_id,
                event.side,
                event.price,
                event.qty,
            ),
            EventKind::NewMarket => {
                self.book
                    .add_market(event.order_id, event.trader_id, event.side, event.qty)
            }
            EventKind::Cancel => self.book.cancel(event.order_id),
            EventKind::Modify => self.book.modify(event.order_id, event.qty, event.price),
        };

        match response.result {
            OrderResult::Accepted | OrderResult::PartiallyFilled | OrderResult::FullyFilled => {
                self.stats.orders_accepted.fetch_add(1, Ordering::Relaxed);
            }
            OrderResult::Cancelled => {
                self.stats.orders_cancelled.fetch_add(1, Ordering::Relaxed);
            }
            OrderResult::Modified => {
                self.stats.orders_modified.fetch_add(1, Ordering::Relaxed);
            }
            OrderResult::Rejected | OrderResult::NotFound => {
                self.stats.rejected_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        if response.qty_filled.0 > 0 {
            self.stats
                .filled_qty
                .fetch_add(response.qty_filled.0 as u64, Ordering::Relaxed);
        }

        self.record_latency(event.enqueue_time);
    }

    fn record_latency(&self, enqueue_time: Timestamp) {
        let total = now_ns().wrapping_sub(enqueue_time) as DurationNs;
        self.stats.record_latency(total);
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn accounts(&self) -> &Arc<Accounts> {
        &self.accounts
    }

    pub fn stats(&self) -> &Arc<EngineStats> {
        &self.stats
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::capture(&self.stats)
    }

    /// Events popped and processed, including risk-rejected ones.
    pub fn events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use crate::types::{OrderId, Price, Qty, Side, TraderId};
    use std::thread;

    fn engine() -> (crate::queue::Producer<OrderEvent>, MatchingEngine) {
        let (tx, rx) = queue::channel(1024);
        (tx, MatchingEngine::new(rx, EngineConfig::default(), None))
    }

    #[test]
    fn limit_order_rests() {
        let (_tx, mut engine) = engine();
        engine.process_event(&OrderEvent::new_limit(
            OrderId(1),
            TraderId(1),
            Side::Buy,
            Price(100),
            Qty(10),
        ));
        assert_eq!(engine.book().best_bid(), Some(Price(100)));
        assert_eq!(engine.events_processed(), 1);

        let snap = engine.snapshot();
        assert_eq!(snap.orders_received, 1);
        assert_eq!(snap.orders_accepted, 1);
        assert_eq!(snap.latency.count, 1);
    }

    #[test]
    fn crossing_orders_settle_accounts() {
        let (_tx, mut engine) = engine();
        engine.process_event(&OrderEvent::new_limit(
            OrderId(1),
            TraderId(0),
            Side::Sell,
            Price(100),
            Qty(10),
        ));
        engine.process_event(&OrderEvent::new_limit(
            OrderId(2),
            TraderId(1),
            Side::Buy,
            Price(100),
            Qty(10),
        ));

        let accounts = engine.accounts();
        let initial = EngineConfig::default().initial_balance;
        assert_eq!(accounts.get_balance(TraderId(0)), initial + 1000);
        assert_eq!(accounts.get_position(TraderId(0)), -10);
        assert_eq!(accounts.get_balance(TraderId(1)), initial - 1000);
        assert_eq!(accounts.get_position(TraderId(1)), 10);

        let snap = engine.snapshot();
        assert_eq!(snap.trade_count, 1);
        assert_eq!(snap.volume, 10);
        assert_eq!(snap.filled_qty, 10);
    }

    #[test]
    fn risk_rejection_counts_and_skips_book() {
        let (_tx, mut engine) = engine();
        // Qty above the default max_order_qty.
        engine.process_event(&OrderEvent::new_limit(
            OrderId(1),
            TraderId(1),
            Side::Buy,
            Price(100),
            Qty(1_000_000),
        ));
        assert_eq!(engine.book().order_count(), 0);
        let snap = engine.snapshot();
        assert_eq!(snap.rejected_count, 1);
        assert_eq!(snap.orders_accepted, 0);
        // Rejected events still count as processed (popped).
        assert_eq!(engine.events_processed(), 1);
    }

    #[test]
    fn cancel_unknown_counts_as_rejected() {
        let (_tx, mut engine) = engine();
        engine.process_event(&OrderEvent::cancel(OrderId(404)));
        let snap = engine.snapshot();
        assert_eq!(snap.rejected_count, 1);
    }

    #[test]
    fn accounts_created_lazily_with_initial_balance() {
        let (_tx, mut engine) = engine();
        assert_eq!(engine.accounts().len(), 0);
        engine.process_event(&OrderEvent::new_limit(
            OrderId(1),
            TraderId(7),
            Side::Sell,
            Price(100),
            Qty(1),
        ));
        assert_eq!(engine.accounts().len(), 1);
        assert_eq!(
            engine.accounts().get_balance(TraderId(7)),
            EngineConfig::default().initial_balance
        );
    }

    #[test]
    fn run_drains_queue_after_stop() {
        let (mut tx, rx) = queue::channel(1024);
        let mut engine = MatchingEngine::new(rx, EngineConfig::default(), None);
        let stop = Arc::new(AtomicBool::new(false));

        // Stop is raised before the engine starts: everything already
        // enqueued must still be processed by the drain pass.
        for i in 0..100u64 {
            tx.push(OrderEvent::new_limit(
                OrderId(i),
                TraderId(1),
                Side::Buy,
                Price(100 + (i % 10) as i64),
                Qty(1),
            ));
        }
        stop.store(true, Ordering::Release);

        let stop_clone = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            engine.run(&stop_clone);
            engine
        });
        let engine = handle.join().unwrap();

        assert_eq!(engine.events_processed(), 100);
        assert_eq!(engine.book().order_count(), 100);
        assert!(!engine.is_running());
    }

    #[test]
    fn modify_uses_stored_trader_binding() {
        let (_tx, mut engine) = engine();
        engine.process_event(&OrderEvent::new_limit(
            OrderId(1),
            TraderId(3),
            Side::Sell,
            Price(100),
            Qty(10),
        ));
        // Modify carries no trader id; the resting order keeps trader 3.
        engine.process_event(&OrderEvent::modify(OrderId(1), Qty(10), Price(105)));
        engine.process_event(&OrderEvent::new_limit(
            OrderId(2),
            TraderId(4),
            Side::Buy,
            Price(105),
            Qty(10),
        ));
        // Trader 3 sold at 105.
        let initial = EngineConfig::default().initial_balance;
        assert_eq!(engine.accounts().get_balance(TraderId(3)), initial + 1050);
    }
}
