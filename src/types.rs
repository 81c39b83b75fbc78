//! Core scalar types for the exchange simulator.
//!
//! Prices, quantities and identifiers are distinct newtypes so they
//! cannot be mixed accidentally. Arithmetic is only defined where it is
//! meaningful (Price +/- Price, Qty +/- Qty).

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Price in integer ticks (e.g. cents).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(pub i64);

/// Quantity in units (shares, contracts, ...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Qty(pub i64);

/// Unique order identifier, assigned by the producer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(pub u64);

/// Trader/account identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraderId(pub u32);

macro_rules! impl_arith {
    ($t:ty) => {
        impl Add for $t {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }
        impl Sub for $t {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }
        impl AddAssign for $t {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }
        impl SubAssign for $t {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }
    };
}

impl_arith!(Price);
impl_arith!(Qty);

macro_rules! impl_display {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        })*
    };
}

impl_display!(Price, Qty, OrderId, TraderId);

/// Nanosecond timestamp (monotonic within a process).
pub type Timestamp = u64;

/// Duration in nanoseconds.
pub type DurationNs = i64;

/// Index of an order slot in the pool.
pub type OrderHandle = u32;

/// Sentinel handle denoting "no order" (list ends, failed allocation).
pub const NIL_HANDLE: OrderHandle = u32::MAX;

/// Default maximum resting orders in the pool.
pub const DEFAULT_MAX_ORDERS: u32 = 1_000_000;

/// Default maximum price levels reserved per side.
pub const DEFAULT_MAX_PRICE_LEVELS: usize = 1024;

/// Default event queue capacity (must stay a power of two).
pub const DEFAULT_QUEUE_CAPACITY: usize = 65536;

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        })
    }
}

/// Kind of event submitted to the matching engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    NewLimit = 0,
    NewMarket = 1,
    Cancel = 2,
    Modify = 3,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::NewLimit => "NewLimit",
            EventKind::NewMarket => "NewMarket",
            EventKind::Cancel => "Cancel",
            EventKind::Modify => "Modify",
        })
    }
}

/// Outcome of a book operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderResult {
    Accepted = 0,
    PartiallyFilled = 1,
    FullyFilled = 2,
    Cancelled = 3,
    Modified = 4,
    Rejected = 5,
    NotFound = 6,
}

impl fmt::Display for OrderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderResult::Accepted => "Accepted",
            OrderResult::PartiallyFilled => "PartiallyFilled",
            OrderResult::FullyFilled => "FullyFilled",
            OrderResult::Cancelled => "Cancelled",
            OrderResult::Modified => "Modified",
            OrderResult::Rejected => "Rejected",
            OrderResult::NotFound => "NotFound",
        })
    }
}
