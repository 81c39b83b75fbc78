//! Synchronous per-event latency report over `process_event`, using
//! hdrhistogram as an independent cross-check of the engine's own ring.

use std::time::Instant;

use hdrhistogram::Histogram;

use tickmill::engine::{EngineConfig, MatchingEngine};
use tickmill::events::OrderEvent;
use tickmill::queue;
use tickmill::types::{OrderId, Price, Qty, Side, TraderId};

const ITERATIONS: usize = 1_000_000;
const COMMAND_BUFFER: usize = 10_000;

fn main() {
    println!("Preparing latency benchmark...");

    let (_producer, consumer) = queue::channel::<OrderEvent>(1 << 10);
    let mut engine = MatchingEngine::new(consumer, EngineConfig::default(), None);

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000_000, 3).unwrap();

    // Pre-generate events so RNG and allocation stay out of the
    // measured section; ids cycle so the book keeps churning.
    println!("Pre-generating {COMMAND_BUFFER} events...");
    let mut events = Vec::with_capacity(COMMAND_BUFFER);
    for i in 0..COMMAND_BUFFER {
        let order_id = (i + 1) as u64;
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        events.push(OrderEvent::new_limit(
            OrderId(order_id),
            TraderId(1),
            side,
            Price(10_000 + (order_id % 100) as i64),
            Qty(10),
        ));
    }

    // Warm up caches and the branch predictor.
    println!("Warming up ({COMMAND_BUFFER} ops)...");
    for event in &events {
        std::hint::black_box(engine.process_event(event));
    }

    println!("Running {ITERATIONS} iterations...");
    let mut total = std::time::Duration::ZERO;
    let mut cycle = events.iter().cycle();

    for _ in 0..ITERATIONS {
        let event = cycle.next().unwrap();

        let start = Instant::now();
        std::hint::black_box(engine.process_event(event));
        let elapsed = start.elapsed();

        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {ITERATIONS}");
    println!(
        "Throughput: {:.2} ops/sec",
        ITERATIONS as f64 / total.as_secs_f64()
    );
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");

    // The engine's own histogram measured the same events end-to-end
    // (enqueue stamp to completion); print it for comparison.
    println!("\n{}", engine.snapshot().latency);
}
