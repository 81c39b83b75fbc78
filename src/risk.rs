//! Pre-trade risk checks.
//!
//! Stateless given its configuration: every check reads the event and,
//! for the balance rule, the accounts ledger. Rejections happen before
//! the book is touched.

use std::fmt;

use crate::accounts::Accounts;
use crate::events::OrderEvent;
use crate::types::{EventKind, Price, Qty, Side};

/// Risk limits applied to every non-cancel event.
#[derive(Clone, Copy, Debug)]
pub struct RiskConfig {
    /// Maximum notional (price * qty) per order.
    pub max_order_value: i64,
    /// Maximum absolute position size.
    pub max_position: i64,
    /// Maximum quantity per order.
    pub max_order_qty: Qty,
    pub max_price: Price,
    pub min_price: Price,
    /// Require buyers to hold the full notional.
    pub check_balance: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_order_value: 1_000_000_000,
            max_position: 1_000_000,
            max_order_qty: Qty(100_000),
            max_price: Price(1_000_000),
            min_price: Price(1),
            check_balance: true,
        }
    }
}

/// Outcome of a pre-trade check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RiskResult {
    Passed = 0,
    InvalidPrice = 1,
    InvalidQty = 2,
    ExceedsMaxOrderValue = 3,
    ExceedsMaxPosition = 4,
    InsufficientBalance = 5,
    UnknownTrader = 6,
}

impl fmt::Display for RiskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskResult::Passed => "Passed",
            RiskResult::InvalidPrice => "InvalidPrice",
            RiskResult::InvalidQty => "InvalidQty",
            RiskResult::ExceedsMaxOrderValue => "ExceedsMaxOrderValue",
            RiskResult::ExceedsMaxPosition => "ExceedsMaxPosition",
            RiskResult::InsufficientBalance => "InsufficientBalance",
            RiskResult::UnknownTrader => "UnknownTrader",
        })
    }
}

/// Fast pre-trade validator; fails obviously bad orders before they
/// reach the book.
#[derive(Clone, Copy, Debug, Default)]
pub struct RiskChecker {
    config: RiskConfig,
}

impl RiskChecker {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn check(&self, event: &OrderEvent, accounts: &Accounts) -> RiskResult {
        // Cancels are always allowed through.
        if event.kind == EventKind::Cancel {
            return RiskResult::Passed;
        }

        // Price bounds apply to priced events; market orders carry none.
        if matches!(event.kind, EventKind::NewLimit | EventKind::Modify)
            && (event.price < self.config.min_price || event.price > self.config.max_price)
        {
            return RiskResult::InvalidPrice;
        }

        if event.qty.0 <= 0 || event.qty > self.config.max_order_qty {
            return RiskResult::InvalidQty;
        }

        let notional = event.price.0 * event.qty.0;
        if notional > self.config.max_order_value {
            return RiskResult::ExceedsMaxOrderValue;
        }

        if self.config.check_balance
            && event.side == Side::Buy
            && !accounts.has_sufficient_balance(event.trader_id, notional)
        {
            return RiskResult::InsufficientBalance;
        }

        RiskResult::Passed
    }
}
