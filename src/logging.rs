//! Bounded async logger.
//!
//! The hot path formats into a fixed-size ring entry and returns; a
//! background thread drains the ring to the log file every 10 ms and
//! once more on shutdown. When the ring is full the message is dropped
//! and counted, so the engine thread never waits on file I/O.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::time::now_ns;
use crate::types::Timestamp;

const MAX_MESSAGE_LEN: usize = 240;
const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Copy)]
struct LogEntry {
    timestamp: Timestamp,
    message: [u8; MAX_MESSAGE_LEN],
    len: usize,
}

impl LogEntry {
    const fn empty() -> Self {
        Self {
            timestamp: 0,
            message: [0; MAX_MESSAGE_LEN],
            len: 0,
        }
    }
}

struct LogRing {
    entries: Vec<LogEntry>,
    mask: usize,
    head: usize,
    tail: usize,
}

impl LogRing {
    fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two());
        Self {
            entries: vec![LogEntry::empty(); capacity],
            mask: capacity - 1,
            head: 0,
            tail: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.head.wrapping_sub(self.tail) > self.mask
    }
}

struct Shared {
    ring: Mutex<LogRing>,
    logged: AtomicU64,
    dropped: AtomicU64,
    stop: AtomicBool,
}

/// Non-blocking logger backed by a bounded ring and a flush thread.
pub struct RingLogger {
    shared: Arc<Shared>,
    flush_thread: Option<JoinHandle<()>>,
}

impl RingLogger {
    pub const DEFAULT_CAPACITY: usize = 4096;

    /// Open `path` for writing and start the flush thread. Failing to
    /// open the file is the only fatal error this type can produce.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::with_capacity(path, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(path: impl AsRef<Path>, capacity: usize) -> io::Result<Self> {
        let file = File::create(path)?;
        let shared = Arc::new(Shared {
            ring: Mutex::new(LogRing::new(capacity)),
            logged: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            stop: AtomicBool::new(false),
        });

        let flush_shared = Arc::clone(&shared);
        let flush_thread = thread::Builder::new()
            .name("log-flush".into())
            .spawn(move || {
                let mut writer = BufWriter::new(file);
                while !flush_shared.stop.load(Ordering::Acquire) {
                    thread::sleep(FLUSH_INTERVAL);
                    Self::flush_ring(&flush_shared, &mut writer);
                }
                Self::flush_ring(&flush_shared, &mut writer);
            })?;

        Ok(Self {
            shared,
            flush_thread: Some(flush_thread),
        })
    }

    /// Enqueue a formatted message; drops it (and counts the drop) when
    /// the ring is full. Truncates at the fixed entry size.
    pub fn log(&self, args: fmt::Arguments<'_>) {
        let mut ring = self.shared.ring.lock().unwrap();
        if ring.is_full() {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let slot = ring.head & ring.mask;
        let entry = &mut ring.entries[slot];
        entry.timestamp = now_ns();

        let mut cursor = &mut entry.message[..];
        let _ = cursor.write_fmt(args);
        let remaining = cursor.len();
        entry.len = MAX_MESSAGE_LEN - remaining;

        ring.head = ring.head.wrapping_add(1);
        drop(ring);
        self.shared.logged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_logged(&self) -> u64 {
        self.shared.logged.load(Ordering::Relaxed)
    }

    pub fn messages_dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    fn flush_ring(shared: &Shared, writer: &mut BufWriter<File>) {
        // Copy pending entries out under the lock, write outside it.
        let pending: Vec<LogEntry> = {
            let mut ring = shared.ring.lock().unwrap();
            let mut pending = Vec::new();
            while ring.tail != ring.head {
                let slot = ring.tail & ring.mask;
                pending.push(ring.entries[slot]);
                ring.tail = ring.tail.wrapping_add(1);
            }
            pending
        };

        for entry in &pending {
            let text = String::from_utf8_lossy(&entry.message[..entry.len]);
            let _ = writeln!(writer, "{} {}", entry.timestamp, text);
        }
        let _ = writer.flush();
    }
}

impl Drop for RingLogger {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(handle) = self.flush_thread.take() {
            let _ = handle.join();
        }
    }
}
