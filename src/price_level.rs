//! A price level: the FIFO queue of resting orders at one price.
//!
//! Orders are linked intrusively through their pool handles, giving
//! O(1) append at the tail and O(1) removal from any position (the
//! order's own prev/next links locate its neighbours).

use crate::pool::OrderPool;
use crate::types::{OrderHandle, Price, Qty, NIL_HANDLE};

/// Aggregation of all resting orders sharing one price on one side.
#[derive(Clone, Copy, Debug)]
pub struct PriceLevel {
    pub price: Price,
    pub total_qty: Qty,
    pub order_count: u32,
    pub head: OrderHandle,
    pub tail: OrderHandle,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_qty: Qty(0),
            order_count: 0,
            head: NIL_HANDLE,
            tail: NIL_HANDLE,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Append an order at the tail (lowest time priority).
    pub fn push_back(&mut self, pool: &mut OrderPool, handle: OrderHandle) {
        debug_assert!(pool.is_live(handle));
        let qty = {
            let order = pool.get_mut(handle);
            order.prev = self.tail;
            order.next = NIL_HANDLE;
            order.qty_remaining
        };

        if self.tail != NIL_HANDLE {
            pool.get_mut(self.tail).next = handle;
        } else {
            debug_assert!(self.head == NIL_HANDLE);
            self.head = handle;
        }
        self.tail = handle;

        self.total_qty += qty;
        self.order_count += 1;
    }

    /// Unlink an order from anywhere in the queue.
    ///
    /// The order is not deallocated; the caller owns that step.
    pub fn remove(&mut self, pool: &mut OrderPool, handle: OrderHandle) {
        debug_assert!(pool.is_live(handle));
        let (prev, next, qty) = {
            let order = pool.get(handle);
            (order.prev, order.next, order.qty_remaining)
        };

        if prev != NIL_HANDLE {
            pool.get_mut(prev).next = next;
        } else {
            debug_assert!(self.head == handle);
            self.head = next;
        }

        if next != NIL_HANDLE {
            pool.get_mut(next).prev = prev;
        } else {
            debug_assert!(self.tail == handle);
            self.tail = prev;
        }

        self.total_qty -= qty;
        self.order_count -= 1;

        let order = pool.get_mut(handle);
        order.prev = NIL_HANDLE;
        order.next = NIL_HANDLE;
    }

    /// Handle of the oldest order (next to match), or `NIL_HANDLE`.
    #[inline]
    pub fn front_handle(&self) -> OrderHandle {
        self.head
    }

    /// Shrink the running total after a partial fill or reduce-modify.
    #[inline]
    pub fn reduce_qty(&mut self, qty: Qty) {
        debug_assert!(self.total_qty >= qty);
        self.total_qty -= qty;
    }
}
