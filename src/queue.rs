//! Bounded single-producer/single-consumer queue coordinated by two
//! counting semaphores.
//!
//! Backpressure is expressed as counters rather than spinning on the
//! ring indices: the producer sleeps on `free_slots` when the ring is
//! full, the consumer sleeps on `filled_slots` when it is empty. The
//! try-variants keep the fast paths wait-free.
//!
//! `channel` returns split `Producer`/`Consumer` handles; each is `Send`
//! but not `Clone`, so the one-producer/one-consumer contract is
//! enforced by the type system.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;

/// Counting semaphore built on a mutex-guarded counter and a condvar.
struct Semaphore {
    count: Mutex<usize>,
    cv: Condvar,
}

impl Semaphore {
    fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            cv: Condvar::new(),
        }
    }

    fn acquire(&self) {
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            count = self.cv.wait(count).unwrap();
        }
        *count -= 1;
    }

    fn try_acquire(&self) -> bool {
        let mut count = self.count.lock().unwrap();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    fn try_acquire_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, result) = self.cv.wait_timeout(count, deadline - now).unwrap();
            count = guard;
            if result.timed_out() && *count == 0 {
                return false;
            }
        }
        *count -= 1;
        true
    }

    fn release(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.cv.notify_one();
    }
}

struct Ring<T> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    /// Producer cursor; padded so it never shares a line with `tail`.
    head: CachePadded<AtomicUsize>,
    /// Consumer cursor.
    tail: CachePadded<AtomicUsize>,
    free_slots: Semaphore,
    filled_slots: Semaphore,
}

// The semaphore protocol guarantees each slot is touched by exactly one
// side at a time: a slot is written only after `free_slots` is acquired
// and read only after `filled_slots` is acquired.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    #[inline]
    fn len_approx(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    #[inline]
    unsafe fn write_slot(&self, value: T) {
        let head = self.head.load(Ordering::Relaxed);
        (*self.buf[head & self.mask].get()).write(value);
        self.head.store(head.wrapping_add(1), Ordering::Release);
    }

    #[inline]
    unsafe fn read_slot(&self) -> T {
        let tail = self.tail.load(Ordering::Relaxed);
        let value = (*self.buf[tail & self.mask].get()).assume_init_read();
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        value
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let mut tail = *self.tail.get_mut();
        while tail != head {
            unsafe {
                (*self.buf[tail & self.mask].get()).assume_init_drop();
            }
            tail = tail.wrapping_add(1);
        }
    }
}

/// Producer half: exactly one thread may hold this.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

/// Consumer half: exactly one thread may hold this.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

/// Create a bounded SPSC channel.
///
/// # Panics
/// Panics unless `capacity` is a positive power of two.
pub fn channel<T: Send>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(
        capacity > 0 && capacity.is_power_of_two(),
        "queue capacity must be a positive power of two"
    );

    let buf = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let ring = Arc::new(Ring {
        buf,
        mask: capacity - 1,
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
        free_slots: Semaphore::new(capacity),
        filled_slots: Semaphore::new(0),
    });

    (
        Producer { ring: Arc::clone(&ring) },
        Consumer { ring },
    )
}

impl<T> Producer<T> {
    /// Push, blocking until a slot is free. The event is visible to the
    /// consumer before this returns.
    pub fn push(&mut self, value: T) {
        self.ring.free_slots.acquire();
        unsafe { self.ring.write_slot(value) };
        self.ring.filled_slots.release();
    }

    /// Push without waiting; hands the value back if the queue is full.
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        if !self.ring.free_slots.try_acquire() {
            return Err(value);
        }
        unsafe { self.ring.write_slot(value) };
        self.ring.filled_slots.release();
        Ok(())
    }

    /// Push, waiting up to `timeout` for a free slot.
    pub fn try_push_for(&mut self, value: T, timeout: Duration) -> Result<(), T> {
        if !self.ring.free_slots.try_acquire_for(timeout) {
            return Err(value);
        }
        unsafe { self.ring.write_slot(value) };
        self.ring.filled_slots.release();
        Ok(())
    }

    /// Approximate occupancy; may be stale by one element.
    pub fn len_approx(&self) -> usize {
        self.ring.len_approx()
    }

    pub fn is_full_approx(&self) -> bool {
        self.ring.len_approx() >= self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.ring.mask + 1
    }
}

impl<T> Consumer<T> {
    /// Pop, blocking until an element is available.
    pub fn pop(&mut self) -> T {
        self.ring.filled_slots.acquire();
        let value = unsafe { self.ring.read_slot() };
        self.ring.free_slots.release();
        value
    }

    /// Pop without waiting.
    pub fn try_pop(&mut self) -> Option<T> {
        if !self.ring.filled_slots.try_acquire() {
            return None;
        }
        let value = unsafe { self.ring.read_slot() };
        self.ring.free_slots.release();
        Some(value)
    }

    /// Pop, waiting up to `timeout` for an element.
    pub fn try_pop_for(&mut self, timeout: Duration) -> Option<T> {
        if !self.ring.filled_slots.try_acquire_for(timeout) {
            return None;
        }
        let value = unsafe { self.ring.read_slot() };
        self.ring.free_slots.release();
        Some(value)
    }

    /// Approximate occupancy; may be stale by one element.
    pub fn len_approx(&self) -> usize {
        self.ring.len_approx()
    }

    pub fn is_empty_approx(&self) -> bool {
        self.ring.len_approx() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.mask + 1
    }
}
