//! Price-time-priority limit order book.
//!
//! Price levels live in flat sorted vectors (bids descending, asks
//! ascending) so matching walks the best levels with cache-friendly
//! traversal; `find_or_insert_level` keeps them ordered with a binary
//! search. Resting orders live in the [`OrderPool`] and are linked into
//! their level's FIFO; an `FxHashMap` from order id to handle gives
//! O(1) cancel and modify.
//!
//! A single mutex guards all mutations and read queries. Normal
//! operation is single-writer (the engine loop); the lock exists so
//! snapshot readers can be added without a rewrite. Public methods are
//! self-locking; compound operations (modify = cancel + add) run on the
//! inner state to avoid re-entering the lock.

use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::events::{OrderResponse, Trade};
use crate::pool::{Order, OrderPool};
use crate::price_level::PriceLevel;
use crate::types::{
    OrderHandle, OrderId, OrderResult, Price, Qty, Side, TraderId, DEFAULT_MAX_ORDERS,
    DEFAULT_MAX_PRICE_LEVELS,
};

/// Sink invoked synchronously for every executed trade.
pub type TradeSink = Box<dyn FnMut(&Trade) + Send>;

struct BookInner {
    pool: OrderPool,
    order_map: FxHashMap<OrderId, OrderHandle>,
    /// Bid levels, strictly descending by price.
    bids: Vec<PriceLevel>,
    /// Ask levels, strictly ascending by price.
    asks: Vec<PriceLevel>,
    trade_sink: Option<TradeSink>,
    total_trades: u64,
    total_volume: u64,
}

impl BookInner {
    fn new(max_orders: u32, max_levels: usize) -> Self {
        let mut bids = Vec::new();
        let mut asks = Vec::new();
        bids.reserve(max_levels);
        asks.reserve(max_levels);

        Self {
            pool: OrderPool::new(max_orders),
            order_map: FxHashMap::with_capacity_and_hasher(max_orders as usize, Default::default()),
            bids,
            asks,
            trade_sink: None,
            total_trades: 0,
            total_volume: 0,
        }
    }

    /// Binary-search position of `price`, ordered per side.
    ///
    /// The predicate is "this level sorts before `price`": for bids
    /// `level.price > price` (descending), for asks `level.price < price`
    /// (ascending).
    fn find_or_insert_level(levels: &mut Vec<PriceLevel>, price: Price, is_bid: bool) -> usize {
        let idx = levels.partition_point(|level| {
            if is_bid {
                level.price > price
            } else {
                level.price < price
            }
        });

        if idx < levels.len() && levels[idx].price == price {
            return idx;
        }
        levels.insert(idx, PriceLevel::new(price));
        idx
    }

    fn find_level(levels: &[PriceLevel], price: Price, is_bid: bool) -> Option<usize> {
        let idx = levels.partition_point(|level| {
            if is_bid {
                level.price > price
            } else {
                level.price < price
            }
        });

        if idx < levels.len() && levels[idx].price == price {
            Some(idx)
        } else {
            None
        }
    }

    /// Match a taker against the opposite side, best price outward.
    ///
    /// Returns the unfilled remainder. Fully filled makers are unlinked,
    /// erased from the order map and returned to the pool; emptied
    /// levels are removed from their side.
    fn match_order(
        &mut self,
        taker_order_id: OrderId,
        taker_trader_id: TraderId,
        side: Side,
        limit_price: Price,
        qty: Qty,
        is_market: bool,
        trade_count: &mut usize,
    ) -> Qty {
        let mut remaining = qty;

        while remaining.0 > 0 {
            let levels = match side {
                Side::Buy => &mut self.asks,
                Side::Sell => &mut self.bids,
            };
            let Some(level) = levels.first_mut() else {
                break;
            };

            // Limit takers stop at the first level worse than their bound.
            if !is_market {
                let worse = match side {
                    Side::Buy => level.price > limit_price,
                    Side::Sell => level.price < limit_price,
                };
                if worse {
                    break;
                }
            }

            while remaining.0 > 0 && !level.is_empty() {
                let maker_handle = level.front_handle();
                let (maker_order_id, maker_trader_id, maker_price, maker_qty) = {
                    let maker = self.pool.get(maker_handle);
                    (maker.order_id, maker.trader_id, maker.price, maker.qty_remaining)
                };

                let fill = Qty(remaining.0.min(maker_qty.0));

                let trade = Trade::new(
                    maker_order_id,
                    taker_order_id,
                    maker_trader_id,
                    taker_trader_id,
                    maker_price,
                    fill,
                    side,
                );

                self.pool.get_mut(maker_handle).qty_remaining -= fill;
                level.reduce_qty(fill);
                remaining -= fill;

                if let Some(sink) = self.trade_sink.as_mut() {
                    sink(&trade);
                }
                *trade_count += 1;
                self.total_trades += 1;
                self.total_volume += fill.0 as u64;

                if self.pool.get(maker_handle).is_filled() {
                    level.remove(&mut self.pool, maker_handle);
                    self.order_map.remove(&maker_order_id);
                    self.pool.deallocate(maker_handle);
                }
            }

            if level.is_empty() {
                levels.remove(0);
            } else {
                // Taker exhausted against a still-populated level.
                break;
            }
        }

        remaining
    }

    fn add_limit(
        &mut self,
        order_id: OrderId,
        trader_id: TraderId,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> OrderResponse {
        let mut response = OrderResponse::new(order_id);

        if self.order_map.contains_key(&order_id) {
            response.result = OrderResult::Rejected;
            return response;
        }

        let mut trades = 0usize;
        let remaining =
            self.match_order(order_id, trader_id, side, price, qty, false, &mut trades);
        response.trade_count = trades;
        response.qty_filled = qty - remaining;
        response.qty_remaining = remaining;

        if remaining.0 <= 0 {
            response.result = OrderResult::FullyFilled;
            return response;
        }

        let Some(handle) = self
            .pool
            .allocate(Order::new(order_id, trader_id, side, price, remaining))
        else {
            response.result = OrderResult::Rejected;
            return response;
        };

        self.order_map.insert(order_id, handle);

        let is_bid = side == Side::Buy;
        let levels = if is_bid { &mut self.bids } else { &mut self.asks };
        let idx = Self::find_or_insert_level(levels, price, is_bid);
        levels[idx].push_back(&mut self.pool, handle);

        response.result = if trades > 0 {
            OrderResult::PartiallyFilled
        } else {
            OrderResult::Accepted
        };
        response
    }

    fn add_market(
        &mut self,
        order_id: OrderId,
        trader_id: TraderId,
        side: Side,
        qty: Qty,
    ) -> OrderResponse {
        let mut response = OrderResponse::new(order_id);

        let mut trades = 0usize;
        let remaining =
            self.match_order(order_id, trader_id, side, Price(0), qty, true, &mut trades);

        response.trade_count = trades;
        response.qty_filled = qty - remaining;
        response.qty_remaining = remaining;
        // An empty opposite side yields PartiallyFilled with zero filled.
        response.result = if remaining.0 <= 0 {
            OrderResult::FullyFilled
        } else {
            OrderResult::PartiallyFilled
        };
        response
    }

    fn cancel(&mut self, order_id: OrderId) -> OrderResponse {
        let mut response = OrderResponse::new(order_id);

        let Some(&handle) = self.order_map.get(&order_id) else {
            response.result = OrderResult::NotFound;
            return response;
        };

        response.qty_remaining = self.pool.get(handle).qty_remaining;
        self.remove_order(handle);
        self.order_map.remove(&order_id);

        response.result = OrderResult::Cancelled;
        response
    }

    fn modify(&mut self, order_id: OrderId, new_qty: Qty, new_price: Price) -> OrderResponse {
        let mut response = OrderResponse::new(order_id);

        let Some(&handle) = self.order_map.get(&order_id) else {
            response.result = OrderResult::NotFound;
            return response;
        };

        let (trader_id, side, price, qty_remaining) = {
            let order = self.pool.get(handle);
            (order.trader_id, order.side, order.price, order.qty_remaining)
        };

        // Price change: cancel and re-add at the new level, same id.
        if new_price.0 != 0 && new_price != price {
            self.remove_order(handle);
            self.order_map.remove(&order_id);
            return self.add_limit(order_id, trader_id, side, new_price, new_qty);
        }

        if new_qty <= qty_remaining {
            // Reducing (or keeping) quantity preserves time priority.
            let diff = qty_remaining - new_qty;
            let is_bid = side == Side::Buy;
            let levels = if is_bid { &mut self.bids } else { &mut self.asks };
            if let Some(idx) = Self::find_level(levels, price, is_bid) {
                levels[idx].reduce_qty(diff);
            }
            self.pool.get_mut(handle).qty_remaining = new_qty;

            response.qty_remaining = new_qty;
            response.result = OrderResult::Modified;
            response
        } else {
            // Increasing quantity loses priority: cancel + re-add.
            self.remove_order(handle);
            self.order_map.remove(&order_id);
            self.add_limit(order_id, trader_id, side, price, new_qty)
        }
    }

    /// Unlink `handle` from its level (dropping the level if emptied)
    /// and return the slot to the pool. The order map entry is the
    /// caller's responsibility.
    fn remove_order(&mut self, handle: OrderHandle) {
        debug_assert!(self.pool.is_live(handle));
        let (side, price) = {
            let order = self.pool.get(handle);
            (order.side, order.price)
        };

        let is_bid = side == Side::Buy;
        let levels = if is_bid { &mut self.bids } else { &mut self.asks };
        if let Some(idx) = Self::find_level(levels, price, is_bid) {
            levels[idx].remove(&mut self.pool, handle);
            if levels[idx].is_empty() {
                levels.remove(idx);
            }
        }

        self.pool.deallocate(handle);
    }

    fn best_bid(&self) -> Option<Price> {
        self.bids.iter().find(|l| !l.is_empty()).map(|l| l.price)
    }

    fn best_ask(&self) -> Option<Price> {
        self.asks.iter().find(|l| !l.is_empty()).map(|l| l.price)
    }

    fn best_bid_qty(&self) -> Qty {
        self.bids
            .iter()
            .find(|l| !l.is_empty())
            .map(|l| l.total_qty)
            .unwrap_or(Qty(0))
    }

    fn best_ask_qty(&self) -> Qty {
        self.asks
            .iter()
            .find(|l| !l.is_empty())
            .map(|l| l.total_qty)
            .unwrap_or(Qty(0))
    }

    fn clear(&mut self) {
        self.pool.clear();
        self.order_map.clear();
        self.bids.clear();
        self.asks.clear();
        self.total_trades = 0;
        self.total_volume = 0;
    }
}

/// The central limit order book. See the module docs for the locking
/// discipline.
pub struct OrderBook {
    inner: Mutex<BookInner>,
}

impl OrderBook {
    /// Book with reserved capacity for `max_orders` resting orders and
    /// `max_levels` price levels per side.
    pub fn new(max_orders: u32, max_levels: usize) -> Self {
        Self {
            inner: Mutex::new(BookInner::new(max_orders, max_levels)),
        }
    }

    /// Install the sink invoked for every executed trade. It runs inside
    /// the book lock and must not block for long.
    pub fn set_trade_sink(&self, sink: impl FnMut(&Trade) + Send + 'static) {
        self.inner.lock().unwrap().trade_sink = Some(Box::new(sink));
    }

    /// Add a limit order: match what crosses, rest the remainder.
    pub fn add_limit(
        &self,
        order_id: OrderId,
        trader_id: TraderId,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> OrderResponse {
        self.inner
            .lock()
            .unwrap()
            .add_limit(order_id, trader_id, side, price, qty)
    }

    /// Add a market order: match immediately, never rest.
    pub fn add_market(
        &self,
        order_id: OrderId,
        trader_id: TraderId,
        side: Side,
        qty: Qty,
    ) -> OrderResponse {
        self.inner
            .lock()
            .unwrap()
            .add_market(order_id, trader_id, side, qty)
    }

    /// Cancel a resting order by id.
    pub fn cancel(&self, order_id: OrderId) -> OrderResponse {
        self.inner.lock().unwrap().cancel(order_id)
    }

    /// Modify quantity and optionally price. `Price(0)` keeps the
    /// current price; reducing quantity in place preserves priority,
    /// anything else is cancel + re-add under the same id.
    pub fn modify(&self, order_id: OrderId, new_qty: Qty, new_price: Price) -> OrderResponse {
        self.inner.lock().unwrap().modify(order_id, new_qty, new_price)
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.inner.lock().unwrap().best_bid()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.inner.lock().unwrap().best_ask()
    }

    pub fn best_bid_qty(&self) -> Qty {
        self.inner.lock().unwrap().best_bid_qty()
    }

    pub fn best_ask_qty(&self) -> Qty {
        self.inner.lock().unwrap().best_ask_qty()
    }

    /// Ask minus bid, in ticks.
    pub fn spread(&self) -> Option<i64> {
        let inner = self.inner.lock().unwrap();
        match (inner.best_bid(), inner.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.0 - bid.0),
            _ => None,
        }
    }

    pub fn mid_price(&self) -> Option<f64> {
        let inner = self.inner.lock().unwrap();
        match (inner.best_bid(), inner.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.0 as f64 + ask.0 as f64) / 2.0),
            _ => None,
        }
    }

    /// Number of resting orders.
    pub fn order_count(&self) -> usize {
        self.inner.lock().unwrap().pool.len() as usize
    }

    pub fn bid_levels(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .bids
            .iter()
            .filter(|l| !l.is_empty())
            .count()
    }

    pub fn ask_levels(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .asks
            .iter()
            .filter(|l| !l.is_empty())
            .count()
    }

    pub fn has_order(&self, order_id: OrderId) -> bool {
        self.inner.lock().unwrap().order_map.contains_key(&order_id)
    }

    /// Total trades executed since construction (or `clear`).
    pub fn trade_count(&self) -> u64 {
        self.inner.lock().unwrap().total_trades
    }

    /// Total quantity traded since construction (or `clear`).
    pub fn total_volume(&self) -> u64 {
        self.inner.lock().unwrap().total_volume
    }

    /// Remove every order and reset counters. The trade sink stays.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }

    /// Walk the book and check the structural invariants; used by tests
    /// and the stress harness.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        let inner = self.inner.lock().unwrap();

        // Map, pool and level contents agree.
        assert_eq!(inner.order_map.len(), inner.pool.len() as usize);

        let mut linked = 0u32;
        for (levels, is_bid) in [(&inner.bids, true), (&inner.asks, false)] {
            let mut prev_price: Option<Price> = None;
            for level in levels.iter() {
                assert!(!level.is_empty(), "empty level retained");
                if let Some(p) = prev_price {
                    if is_bid {
                        assert!(level.price < p, "bid prices must strictly descend");
                    } else {
                        assert!(level.price > p, "ask prices must strictly ascend");
                    }
                }
                prev_price = Some(level.price);

                let mut handle = level.head;
                let mut count = 0u32;
                let mut qty = Qty(0);
                while handle != crate::types::NIL_HANDLE {
                    assert!(inner.pool.is_live(handle));
                    let order = inner.pool.get(handle);
                    assert_eq!(order.price, level.price);
                    qty += order.qty_remaining;
                    count += 1;
                    handle = order.next;
                }
                assert_eq!(count, level.order_count);
                assert_eq!(qty, level.total_qty);
                linked += count;
            }
        }
        assert_eq!(linked, inner.pool.len());
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ORDERS, DEFAULT_MAX_PRICE_LEVELS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn book() -> OrderBook {
        OrderBook::new(1024, 64)
    }

    fn capture_trades(book: &OrderBook) -> Arc<Mutex<Vec<Trade>>> {
        let trades = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&trades);
        book.set_trade_sink(move |t: &Trade| sink.lock().unwrap().push(*t));
        trades
    }

    #[test]
    fn resting_bid_updates_top_of_book() {
        let book = book();
        let r = book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(100), Qty(10));
        assert_eq!(r.result, OrderResult::Accepted);
        assert_eq!(book.best_bid(), Some(Price(100)));
        assert_eq!(book.best_bid_qty(), Qty(10));
        assert_eq!(book.bid_levels(), 1);
        assert_eq!(book.order_count(), 1);
        book.check_invariants();
    }

    #[test]
    fn crossing_buy_fills_resting_sell() {
        let book = book();
        let trades = capture_trades(&book);

        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(10));
        let r = book.add_limit(OrderId(2), TraderId(2), Side::Buy, Price(100), Qty(10));

        assert_eq!(r.result, OrderResult::FullyFilled);
        assert_eq!(r.qty_filled, Qty(10));
        assert_eq!(r.trade_count, 1);

        let trades = trades.lock().unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Price(100));
        assert_eq!(trades[0].qty, Qty(10));
        assert_eq!(trades[0].maker_order_id, OrderId(1));
        assert_eq!(trades[0].taker_order_id, OrderId(2));
        assert_eq!(trades[0].taker_side, Side::Buy);

        assert_eq!(book.order_count(), 0);
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        book.check_invariants();
    }

    #[test]
    fn buy_sweeps_three_ask_levels() {
        let book = book();
        let trades = capture_trades(&book);

        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(10));
        book.add_limit(OrderId(2), TraderId(1), Side::Sell, Price(101), Qty(10));
        book.add_limit(OrderId(3), TraderId(1), Side::Sell, Price(102), Qty(10));

        let r = book.add_limit(OrderId(4), TraderId(2), Side::Buy, Price(102), Qty(25));
        assert_eq!(r.result, OrderResult::FullyFilled);
        assert_eq!(r.qty_filled, Qty(25));

        let trades = trades.lock().unwrap();
        let summary: Vec<(i64, i64)> = trades.iter().map(|t| (t.price.0, t.qty.0)).collect();
        assert_eq!(summary, vec![(100, 10), (101, 10), (102, 5)]);

        assert_eq!(book.best_ask(), Some(Price(102)));
        assert_eq!(book.best_ask_qty(), Qty(5));
        assert_eq!(book.ask_levels(), 1);
        book.check_invariants();
    }

    #[test]
    fn time_priority_within_level() {
        let book = book();
        let trades = capture_trades(&book);

        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(10));
        book.add_limit(OrderId(2), TraderId(1), Side::Sell, Price(100), Qty(10));

        let r = book.add_limit(OrderId(3), TraderId(2), Side::Buy, Price(100), Qty(10));
        assert_eq!(r.result, OrderResult::FullyFilled);

        let trades = trades.lock().unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, OrderId(1));

        assert!(book.has_order(OrderId(2)));
        book.check_invariants();
    }

    #[test]
    fn spread_and_mid() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(99), Qty(10));
        book.add_limit(OrderId(2), TraderId(1), Side::Sell, Price(101), Qty(10));
        assert_eq!(book.spread(), Some(2));
        assert_eq!(book.mid_price(), Some(100.0));
    }

    #[test]
    fn limit_taker_respects_price_bound() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(105), Qty(10));
        let r = book.add_limit(OrderId(2), TraderId(2), Side::Buy, Price(100), Qty(10));
        assert_eq!(r.result, OrderResult::Accepted);
        assert_eq!(r.qty_filled, Qty(0));
        assert_eq!(book.order_count(), 2);
    }

    #[test]
    fn partial_fill_rests_remainder() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(4));
        let r = book.add_limit(OrderId(2), TraderId(2), Side::Buy, Price(100), Qty(10));
        assert_eq!(r.result, OrderResult::PartiallyFilled);
        assert_eq!(r.qty_filled, Qty(4));
        assert_eq!(r.qty_remaining, Qty(6));
        assert_eq!(book.best_bid(), Some(Price(100)));
        assert_eq!(book.best_bid_qty(), Qty(6));
        book.check_invariants();
    }

    #[test]
    fn duplicate_order_id_rejected() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(100), Qty(10));
        let r = book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(101), Qty(10));
        assert_eq!(r.result, OrderResult::Rejected);
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn pool_exhaustion_rejects() {
        let book = OrderBook::new(2, 8);
        book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(99), Qty(1));
        book.add_limit(OrderId(2), TraderId(1), Side::Buy, Price(98), Qty(1));
        let r = book.add_limit(OrderId(3), TraderId(1), Side::Buy, Price(97), Qty(1));
        assert_eq!(r.result, OrderResult::Rejected);
        assert_eq!(book.order_count(), 2);
    }

    #[test]
    fn market_order_sweeps_without_bound() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(10));
        book.add_limit(OrderId(2), TraderId(1), Side::Sell, Price(200), Qty(10));

        let r = book.add_market(OrderId(3), TraderId(2), Side::Buy, Qty(15));
        assert_eq!(r.result, OrderResult::FullyFilled);
        assert_eq!(r.qty_filled, Qty(15));
        assert_eq!(r.trade_count, 2);
        assert_eq!(book.best_ask_qty(), Qty(5));
    }

    #[test]
    fn market_order_against_empty_side() {
        let book = book();
        let r = book.add_market(OrderId(1), TraderId(1), Side::Buy, Qty(10));
        assert_eq!(r.result, OrderResult::PartiallyFilled);
        assert_eq!(r.qty_filled, Qty(0));
        assert_eq!(r.qty_remaining, Qty(10));
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn cancel_round_trip_restores_book() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(100), Qty(10));

        let r = book.add_limit(OrderId(2), TraderId(1), Side::Buy, Price(101), Qty(5));
        assert_eq!(r.result, OrderResult::Accepted);
        let r = book.cancel(OrderId(2));
        assert_eq!(r.result, OrderResult::Cancelled);
        assert_eq!(r.qty_remaining, Qty(5));

        assert_eq!(book.best_bid(), Some(Price(100)));
        assert_eq!(book.best_bid_qty(), Qty(10));
        assert_eq!(book.bid_levels(), 1);
        assert_eq!(book.order_count(), 1);
        assert!(!book.has_order(OrderId(2)));
        book.check_invariants();
    }

    #[test]
    fn second_cancel_is_not_found() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(100), Qty(10));
        assert_eq!(book.cancel(OrderId(1)).result, OrderResult::Cancelled);
        assert_eq!(book.cancel(OrderId(1)).result, OrderResult::NotFound);
    }

    #[test]
    fn modify_same_qty_same_price_is_noop() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(10));
        book.add_limit(OrderId(2), TraderId(1), Side::Sell, Price(100), Qty(10));

        // Same qty via the zero-price sentinel: keeps priority.
        let r = book.modify(OrderId(1), Qty(10), Price(0));
        assert_eq!(r.result, OrderResult::Modified);
        assert_eq!(r.trade_count, 0);
        assert_eq!(book.best_ask_qty(), Qty(20));

        // Order 1 still matches first.
        let trades = capture_trades(&book);
        book.add_limit(OrderId(3), TraderId(2), Side::Buy, Price(100), Qty(10));
        assert_eq!(trades.lock().unwrap()[0].maker_order_id, OrderId(1));
        book.check_invariants();
    }

    #[test]
    fn modify_reduce_keeps_priority() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(10));
        book.add_limit(OrderId(2), TraderId(1), Side::Sell, Price(100), Qty(10));

        let r = book.modify(OrderId(1), Qty(4), Price(0));
        assert_eq!(r.result, OrderResult::Modified);
        assert_eq!(r.qty_remaining, Qty(4));
        assert_eq!(book.best_ask_qty(), Qty(14));

        let trades = capture_trades(&book);
        book.add_limit(OrderId(3), TraderId(2), Side::Buy, Price(100), Qty(4));
        assert_eq!(trades.lock().unwrap()[0].maker_order_id, OrderId(1));
        book.check_invariants();
    }

    #[test]
    fn modify_increase_loses_priority() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(10));
        book.add_limit(OrderId(2), TraderId(1), Side::Sell, Price(100), Qty(10));

        let r = book.modify(OrderId(1), Qty(20), Price(0));
        assert_eq!(r.result, OrderResult::Accepted);

        let trades = capture_trades(&book);
        book.add_limit(OrderId(3), TraderId(2), Side::Buy, Price(100), Qty(10));
        assert_eq!(trades.lock().unwrap()[0].maker_order_id, OrderId(2));
        book.check_invariants();
    }

    #[test]
    fn modify_new_price_moves_level() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(100), Qty(10));

        let r = book.modify(OrderId(1), Qty(10), Price(102));
        assert_eq!(r.result, OrderResult::Accepted);
        assert_eq!(book.best_bid(), Some(Price(102)));
        assert_eq!(book.bid_levels(), 1);
        assert!(book.has_order(OrderId(1)));
        book.check_invariants();
    }

    #[test]
    fn modify_to_crossing_price_trades() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(105), Qty(10));
        book.add_limit(OrderId(2), TraderId(2), Side::Buy, Price(100), Qty(10));

        let r = book.modify(OrderId(2), Qty(10), Price(105));
        assert_eq!(r.result, OrderResult::FullyFilled);
        assert_eq!(book.order_count(), 0);
        book.check_invariants();
    }

    #[test]
    fn modify_unknown_is_not_found() {
        let book = book();
        let r = book.modify(OrderId(404), Qty(1), Price(100));
        assert_eq!(r.result, OrderResult::NotFound);
    }

    #[test]
    fn level_prices_stay_sorted() {
        let book = book();
        for (i, price) in [103, 101, 105, 100, 104].into_iter().enumerate() {
            book.add_limit(OrderId(i as u64), TraderId(1), Side::Sell, Price(price), Qty(1));
        }
        for (i, price) in [95, 97, 92, 99, 96].into_iter().enumerate() {
            book.add_limit(
                OrderId(100 + i as u64),
                TraderId(1),
                Side::Buy,
                Price(price),
                Qty(1),
            );
        }
        assert_eq!(book.best_ask(), Some(Price(100)));
        assert_eq!(book.best_bid(), Some(Price(99)));
        book.check_invariants();
    }

    #[test]
    fn trade_counters_are_monotone() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Sell, Price(100), Qty(10));
        book.add_limit(OrderId(2), TraderId(2), Side::Buy, Price(100), Qty(4));
        assert_eq!(book.trade_count(), 1);
        assert_eq!(book.total_volume(), 4);

        book.add_limit(OrderId(3), TraderId(2), Side::Buy, Price(100), Qty(6));
        assert_eq!(book.trade_count(), 2);
        assert_eq!(book.total_volume(), 10);
    }

    #[test]
    fn clear_empties_everything() {
        let book = book();
        book.add_limit(OrderId(1), TraderId(1), Side::Buy, Price(100), Qty(10));
        book.add_limit(OrderId(2), TraderId(1), Side::Sell, Price(101), Qty(10));
        book.clear();
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.bid_levels(), 0);
        assert_eq!(book.ask_levels(), 0);
        assert_eq!(book.trade_count(), 0);
        assert_eq!(book.total_volume(), 0);
        book.check_invariants();
    }
}
