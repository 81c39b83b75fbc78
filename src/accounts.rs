//! Trader accounts with striped locking.
//!
//! Account creation is serialized by a stripe mutex keyed on
//! `trader_id % stripe_count`; the existence scan happens inside the
//! lock, closing the check-then-act race. Once an account exists its
//! fields are plain atomics, so trade settlement never takes a lock.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::types::{Price, Qty, Side, TraderId};

/// Mutable per-trader state. Balance and position are signed; a long
/// position is positive.
#[derive(Debug)]
pub struct Account {
    pub trader_id: TraderId,
    pub balance: AtomicI64,
    pub position: AtomicI64,
    pub trade_count: AtomicU64,
    pub volume: AtomicU64,
}

impl Account {
    fn new(trader_id: TraderId, initial_balance: i64) -> Self {
        Self {
            trader_id,
            balance: AtomicI64::new(initial_balance),
            position: AtomicI64::new(0),
            trade_count: AtomicU64::new(0),
            volume: AtomicU64::new(0),
        }
    }
}

/// Striped-mutex ledger of all trader accounts.
pub struct Accounts {
    stripes: Vec<Mutex<Vec<Arc<Account>>>>,
    total: AtomicUsize,
    max_traders: usize,
}

impl Accounts {
    pub const DEFAULT_STRIPE_COUNT: usize = 16;

    pub fn new(max_traders: usize) -> Self {
        Self::with_stripes(max_traders, Self::DEFAULT_STRIPE_COUNT)
    }

    pub fn with_stripes(max_traders: usize, stripe_count: usize) -> Self {
        assert!(stripe_count > 0);
        Self {
            stripes: (0..stripe_count).map(|_| Mutex::new(Vec::new())).collect(),
            total: AtomicUsize::new(0),
            max_traders,
        }
    }

    #[inline]
    fn stripe(&self, trader_id: TraderId) -> &Mutex<Vec<Arc<Account>>> {
        &self.stripes[trader_id.0 as usize % self.stripes.len()]
    }

    /// Create an account; `false` if it already exists or the ledger is
    /// at capacity.
    pub fn create_account(&self, trader_id: TraderId, initial_balance: i64) -> bool {
        let mut stripe = self.stripe(trader_id).lock().unwrap();
        if stripe.iter().any(|a| a.trader_id == trader_id) {
            return false;
        }
        if self.total.load(Ordering::Relaxed) >= self.max_traders {
            return false;
        }
        stripe.push(Arc::new(Account::new(trader_id, initial_balance)));
        self.total.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Fetch an account, creating it with `initial_balance` on first
    /// sight. Returns `None` only when the ledger is full.
    pub fn get_or_create(&self, trader_id: TraderId, initial_balance: i64) -> Option<Arc<Account>> {
        let mut stripe = self.stripe(trader_id).lock().unwrap();
        if let Some(acc) = stripe.iter().find(|a| a.trader_id == trader_id) {
            return Some(Arc::clone(acc));
        }
        if self.total.load(Ordering::Relaxed) >= self.max_traders {
            return None;
        }
        let acc = Arc::new(Account::new(trader_id, initial_balance));
        stripe.push(Arc::clone(&acc));
        self.total.fetch_add(1, Ordering::Relaxed);
        Some(acc)
    }

    pub fn get(&self, trader_id: TraderId) -> Option<Arc<Account>> {
        let stripe = self.stripe(trader_id).lock().unwrap();
        stripe.iter().find(|a| a.trader_id == trader_id).map(Arc::clone)
    }

    /// Settle one trade against both parties.
    ///
    /// Notional (`price * qty`) moves from the buyer's balance to the
    /// seller's; quantity moves the other way as position.
    pub fn apply_trade(
        &self,
        maker_id: TraderId,
        taker_id: TraderId,
        taker_side: Side,
        price: Price,
        qty: Qty,
    ) {
        let (Some(maker), Some(taker)) = (self.get(maker_id), self.get(taker_id)) else {
            return;
        };

        let notional = price.0 * qty.0;
        let qty = qty.0;

        if taker_side == Side::Buy {
            taker.balance.fetch_sub(notional, Ordering::Relaxed);
            taker.position.fetch_add(qty, Ordering::Relaxed);
            maker.balance.fetch_add(notional, Ordering::Relaxed);
            maker.position.fetch_sub(qty, Ordering::Relaxed);
        } else {
            taker.balance.fetch_add(notional, Ordering::Relaxed);
            taker.position.fetch_sub(qty, Ordering::Relaxed);
            maker.balance.fetch_sub(notional, Ordering::Relaxed);
            maker.position.fetch_add(qty, Ordering::Relaxed);
        }

        maker.trade_count.fetch_add(1, Ordering::Relaxed);
        maker.volume.fetch_add(qty as u64, Ordering::Relaxed);
        taker.trade_count.fetch_add(1, Ordering::Relaxed);
        taker.volume.fetch_add(qty as u64, Ordering::Relaxed);
    }

    /// Deposit (positive) or withdraw (negative). `false` if the account
    /// does not exist.
    pub fn adjust_balance(&self, trader_id: TraderId, amount: i64) -> bool {
        match self.get(trader_id) {
            Some(acc) => {
                acc.balance.fetch_add(amount, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn has_sufficient_balance(&self, trader_id: TraderId, required: i64) -> bool {
        self.get(trader_id)
            .map(|acc| acc.balance.load(Ordering::Relaxed) >= required)
            .unwrap_or(false)
    }

    pub fn get_balance(&self, trader_id: TraderId) -> i64 {
        self.get(trader_id)
            .map(|acc| acc.balance.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn get_position(&self, trader_id: TraderId) -> i64 {
        self.get(trader_id)
            .map(|acc| acc.position.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every account. Holds all stripe locks so a concurrent
    /// creator cannot slip an account between the per-stripe clears.
    pub fn clear(&self) {
        let mut guards: Vec<_> = self.stripes.iter().map(|s| s.lock().unwrap()).collect();
        for guard in guards.iter_mut() {
            guard.clear();
        }
        self.total.store(0, Ordering::Relaxed);
    }
}
