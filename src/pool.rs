//! Fixed-capacity order pool with O(1) allocate/free via a freelist.
//!
//! All storage is allocated at construction; the freelist is threaded
//! through the `next` link of free slots, so no extra memory is needed
//! to track availability. Handles are 32-bit indices, half the size of
//! a pointer, which keeps the intrusive lists cache-friendly.
//!
//! Not synchronized: the pool is owned by the book and touched only by
//! the engine thread.

use crate::time::now_ns;
use crate::types::{OrderHandle, OrderId, Price, Qty, Side, Timestamp, TraderId, NIL_HANDLE};

/// A resting order stored in the pool.
///
/// `prev`/`next` link the order into its price level's FIFO queue.
#[derive(Clone, Copy, Debug)]
pub struct Order {
    pub order_id: OrderId,
    pub trader_id: TraderId,
    pub side: Side,
    pub price: Price,
    pub qty_remaining: Qty,
    pub qty_original: Qty,
    pub timestamp: Timestamp,

    pub prev: OrderHandle,
    pub next: OrderHandle,
}

impl Order {
    pub fn new(order_id: OrderId, trader_id: TraderId, side: Side, price: Price, qty: Qty) -> Self {
        Self {
            order_id,
            trader_id,
            side,
            price,
            qty_remaining: qty,
            qty_original: qty,
            timestamp: now_ns(),
            prev: NIL_HANDLE,
            next: NIL_HANDLE,
        }
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.qty_remaining.0 <= 0
    }

    #[inline]
    pub fn qty_filled(&self) -> Qty {
        self.qty_original - self.qty_remaining
    }
}

impl Default for Order {
    fn default() -> Self {
        Self {
            order_id: OrderId(0),
            trader_id: TraderId(0),
            side: Side::Buy,
            price: Price(0),
            qty_remaining: Qty(0),
            qty_original: Qty(0),
            timestamp: 0,
            prev: NIL_HANDLE,
            next: NIL_HANDLE,
        }
    }
}

struct Slot {
    order: Order,
    live: bool,
}

/// Pre-allocated pool of orders with freelist-based O(1) allocation.
pub struct OrderPool {
    slots: Vec<Slot>,
    free_head: OrderHandle,
    len: u32,
    capacity: u32,
}

impl OrderPool {
    /// Create a pool holding up to `capacity` orders.
    ///
    /// # Panics
    /// Panics if `capacity >= u32::MAX` (the top value is the NIL
    /// sentinel).
    pub fn new(capacity: u32) -> Self {
        assert!(capacity < NIL_HANDLE, "capacity must be below the NIL sentinel");

        let mut slots = Vec::with_capacity(capacity as usize);
        for i in 0..capacity {
            let mut order = Order::default();
            order.next = if i + 1 < capacity { i + 1 } else { NIL_HANDLE };
            slots.push(Slot { order, live: false });
        }

        Self {
            slots,
            free_head: if capacity > 0 { 0 } else { NIL_HANDLE },
            len: 0,
            capacity,
        }
    }

    /// Store `order`, returning its handle, or `None` if the pool is full.
    #[inline]
    pub fn allocate(&mut self, order: Order) -> Option<OrderHandle> {
        if self.free_head == NIL_HANDLE {
            return None;
        }

        let handle = self.free_head;
        let slot = &mut self.slots[handle as usize];
        self.free_head = slot.order.next;

        slot.order = order;
        slot.order.prev = NIL_HANDLE;
        slot.order.next = NIL_HANDLE;
        slot.live = true;
        self.len += 1;

        Some(handle)
    }

    /// Return a slot to the freelist.
    #[inline]
    pub fn deallocate(&mut self, handle: OrderHandle) {
        debug_assert!(handle < self.capacity, "handle out of bounds");
        let slot = &mut self.slots[handle as usize];
        debug_assert!(slot.live, "double free");

        slot.live = false;
        slot.order = Order::default();
        slot.order.next = self.free_head;
        self.free_head = handle;
        self.len -= 1;
    }

    #[inline]
    pub fn get(&self, handle: OrderHandle) -> &Order {
        debug_assert!(self.is_live(handle));
        &self.slots[handle as usize].order
    }

    #[inline]
    pub fn get_mut(&mut self, handle: OrderHandle) -> &mut Order {
        debug_assert!(self.is_live(handle));
        &mut self.slots[handle as usize].order
    }

    /// True if `handle` refers to a currently allocated order.
    #[inline]
    pub fn is_live(&self, handle: OrderHandle) -> bool {
        (handle as usize) < self.slots.len() && self.slots[handle as usize].live
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_head == NIL_HANDLE
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Release every order and rebuild the freelist.
    pub fn clear(&mut self) {
        let capacity = self.capacity;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.live = false;
            slot.order = Order::default();
            slot.order.next = if (i as u32) + 1 < capacity {
                i as u32 + 1
            } else {
                NIL_HANDLE
            };
        }
        self.free_head = if capacity > 0 { 0 } else { NIL_HANDLE };
        self.len = 0;
    }
}
