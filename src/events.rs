//! Event and report types flowing through the pipeline.
//!
//! `OrderEvent` is the queue payload from producer to engine; `Trade`
//! and `OrderResponse` are the engine's outputs.

use crate::time::now_ns;
use crate::types::{EventKind, OrderId, OrderResult, Price, Qty, Side, Timestamp, TraderId};

/// Order event submitted to the matching engine queue.
///
/// One flat record for all four kinds: price is ignored for market and
/// cancel events, trader_id for cancel and modify.
#[derive(Clone, Copy, Debug)]
pub struct OrderEvent {
    pub kind: EventKind,
    pub order_id: OrderId,
    pub trader_id: TraderId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    /// Stamped by the producer for end-to-end latency measurement.
    pub enqueue_time: Timestamp,
}

impl OrderEvent {
    /// New resting-capable limit order.
    #[inline]
    pub fn new_limit(
        order_id: OrderId,
        trader_id: TraderId,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> Self {
        Self {
            kind: EventKind::NewLimit,
            order_id,
            trader_id,
            side,
            price,
            qty,
            enqueue_time: now_ns(),
        }
    }

    /// Market order: matches immediately, never rests.
    #[inline]
    pub fn new_market(order_id: OrderId, trader_id: TraderId, side: Side, qty: Qty) -> Self {
        Self {
            kind: EventKind::NewMarket,
            order_id,
            trader_id,
            side,
            price: Price(0),
            qty,
            enqueue_time: now_ns(),
        }
    }

    /// Cancel an existing order by id.
    #[inline]
    pub fn cancel(order_id: OrderId) -> Self {
        Self {
            kind: EventKind::Cancel,
            order_id,
            trader_id: TraderId(u32::MAX),
            side: Side::Buy,
            price: Price(0),
            qty: Qty(0),
            enqueue_time: now_ns(),
        }
    }

    /// Modify quantity and optionally price; `Price(0)` means keep the
    /// current price.
    #[inline]
    pub fn modify(order_id: OrderId, new_qty: Qty, new_price: Price) -> Self {
        Self {
            kind: EventKind::Modify,
            order_id,
            trader_id: TraderId(u32::MAX),
            side: Side::Buy,
            price: new_price,
            qty: new_qty,
            enqueue_time: now_ns(),
        }
    }
}

/// Trade execution report emitted through the book's trade sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trade {
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_trader_id: TraderId,
    pub taker_trader_id: TraderId,
    /// Execution price: the maker's resting price.
    pub price: Price,
    pub qty: Qty,
    pub taker_side: Side,
    pub timestamp: Timestamp,
}

impl Trade {
    pub fn new(
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_trader_id: TraderId,
        taker_trader_id: TraderId,
        price: Price,
        qty: Qty,
        taker_side: Side,
    ) -> Self {
        Self {
            maker_order_id,
            taker_order_id,
            maker_trader_id,
            taker_trader_id,
            price,
            qty,
            taker_side,
            timestamp: now_ns(),
        }
    }

    /// Notional value (price x qty).
    #[inline]
    pub fn notional(&self) -> i64 {
        self.price.0 * self.qty.0
    }
}

/// Result of a single book operation.
#[derive(Clone, Copy, Debug)]
pub struct OrderResponse {
    pub result: OrderResult,
    pub order_id: OrderId,
    pub qty_filled: Qty,
    pub qty_remaining: Qty,
    /// Number of trades this operation generated.
    pub trade_count: usize,
}

impl OrderResponse {
    pub fn new(order_id: OrderId) -> Self {
        Self {
            result: OrderResult::Rejected,
            order_id,
            qty_filled: Qty(0),
            qty_remaining: Qty(0),
            trade_count: 0,
        }
    }

    /// True unless the operation was rejected or targeted a missing order.
    #[inline]
    pub fn success(&self) -> bool {
        self.result != OrderResult::Rejected && self.result != OrderResult::NotFound
    }
}
