//! Synthetic order-flow generator: the producer side of the pipeline.
//!
//! Draws limit/market/cancel/modify events from a seeded ChaCha8 RNG so
//! a given seed always produces the same stream, and pushes them with
//! blocking `push` so the bounded queue provides backpressure.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::events::OrderEvent;
use crate::pinning;
use crate::queue::Producer;
use crate::types::{OrderId, Price, Qty, Side, TraderId};

/// Parameters for synthetic order generation.
#[derive(Clone, Debug)]
pub struct TraderConfig {
    pub trader_id: TraderId,
    pub seed: u64,
    pub orders_to_generate: u64,

    /// Center of the uniform price distribution.
    pub base_price: Price,
    /// Half-width of the price distribution.
    pub price_range: i64,

    pub min_qty: Qty,
    pub max_qty: Qty,

    pub prob_buy: f64,
    /// Probability a new order is a limit rather than a market order.
    pub prob_limit: f64,
    pub prob_cancel: f64,
    pub prob_modify: f64,

    pub pin_to_core: Option<usize>,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            trader_id: TraderId(0),
            seed: 12345,
            orders_to_generate: 1000,
            base_price: Price(10_000),
            price_range: 100,
            min_qty: Qty(1),
            max_qty: Qty(100),
            prob_buy: 0.5,
            prob_limit: 0.95,
            prob_cancel: 0.1,
            prob_modify: 0.05,
            pin_to_core: None,
        }
    }
}

/// Producer thread body generating a deterministic event stream.
pub struct Trader {
    config: TraderConfig,
    producer: Producer<OrderEvent>,
    rng: ChaCha8Rng,
    sent_order_ids: Vec<OrderId>,
    next_order_id: u64,
    orders_sent: AtomicU64,
}

impl Trader {
    /// `starting_order_id` must be unique across producers so ids never
    /// collide.
    pub fn new(config: TraderConfig, producer: Producer<OrderEvent>, starting_order_id: u64) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let capacity = config.orders_to_generate as usize;
        Self {
            config,
            producer,
            rng,
            sent_order_ids: Vec::with_capacity(capacity.min(1 << 20)),
            next_order_id: starting_order_id,
            orders_sent: AtomicU64::new(0),
        }
    }

    /// Generate and push events until the configured count is reached
    /// or `stop` is raised.
    pub fn run(&mut self, stop: &AtomicBool) {
        if let Some(core) = self.config.pin_to_core {
            let _ = pinning::pin_to_core(core);
        }

        while !stop.load(Ordering::Acquire)
            && self.orders_sent.load(Ordering::Relaxed) < self.config.orders_to_generate
        {
            let event = self.generate_event();
            self.producer.push(event);

            if matches!(
                event.kind,
                crate::types::EventKind::NewLimit | crate::types::EventKind::NewMarket
            ) {
                self.sent_order_ids.push(event.order_id);
            }

            self.orders_sent.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn orders_sent(&self) -> u64 {
        self.orders_sent.load(Ordering::Relaxed)
    }

    pub fn trader_id(&self) -> TraderId {
        self.config.trader_id
    }

    fn random_price(&mut self) -> Price {
        let lo = self.config.base_price.0 - self.config.price_range;
        let hi = self.config.base_price.0 + self.config.price_range;
        Price(self.rng.gen_range(lo..=hi))
    }

    fn random_qty(&mut self) -> Qty {
        Qty(self.rng.gen_range(self.config.min_qty.0..=self.config.max_qty.0))
    }

    fn generate_event(&mut self) -> OrderEvent {
        let r: f64 = self.rng.gen();

        let can_target_existing = !self.sent_order_ids.is_empty();
        let is_cancel = can_target_existing && r < self.config.prob_cancel;
        let is_modify = can_target_existing
            && !is_cancel
            && r < self.config.prob_cancel + self.config.prob_modify;

        if is_cancel {
            let idx = self.rng.gen_range(0..self.sent_order_ids.len());
            return OrderEvent::cancel(self.sent_order_ids[idx]);
        }

        if is_modify {
            let idx = self.rng.gen_range(0..self.sent_order_ids.len());
            let target = self.sent_order_ids[idx];
            let new_qty = self.random_qty();
            let new_price = self.random_price();
            return OrderEvent::modify(target, new_qty, new_price);
        }

        let order_id = OrderId(self.next_order_id);
        self.next_order_id += 1;

        let side = if self.rng.gen_bool(self.config.prob_buy) {
            Side::Buy
        } else {
            Side::Sell
        };
        let qty = self.random_qty();

        if self.rng.gen_bool(self.config.prob_limit) {
            let price = self.random_price();
            OrderEvent::new_limit(order_id, self.config.trader_id, side, price, qty)
        } else {
            OrderEvent::new_market(order_id, self.config.trader_id, side, qty)
        }
    }
}
