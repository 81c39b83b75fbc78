//! Simulation harness: one synthetic trader feeding one matching
//! engine through the bounded event queue.
//!
//! ```text
//! tickmill [--orders N] [--traders T] [--seed S] [--pin] [--log FILE]
//! ```

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tickmill::engine::{EngineConfig, MatchingEngine};
use tickmill::logging::RingLogger;
use tickmill::pinning;
use tickmill::queue;
use tickmill::time::now_ns;
use tickmill::trader::{Trader, TraderConfig};
use tickmill::types::{TraderId, DEFAULT_QUEUE_CAPACITY};

const DEFAULT_ORDERS: u64 = 10_000;
const DEFAULT_SEED: u64 = 12345;

struct Config {
    orders: u64,
    traders: usize,
    seed: u64,
    enable_pinning: bool,
    log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orders: DEFAULT_ORDERS,
            traders: 1,
            seed: DEFAULT_SEED,
            enable_pinning: false,
            log_file: None,
        }
    }
}

fn print_usage(program: &str) {
    println!("Usage: {program} [options]");
    println!();
    println!("Options:");
    println!("  --orders N      Total orders to generate (default: {DEFAULT_ORDERS})");
    println!("  --traders T     Number of trader threads (must be 1)");
    println!("  --seed S        Random seed (default: {DEFAULT_SEED})");
    println!("  --pin           Enable thread pinning");
    println!("  --log FILE      Log file path (default: none)");
    println!("  --help          Show this help message");
}

fn parse_args(args: &[String]) -> Result<Option<Config>, String> {
    let mut config = Config::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str| {
            iter.next()
                .map(String::as_str)
                .ok_or_else(|| format!("{flag} requires a value"))
        };

        match arg.as_str() {
            "--orders" => {
                let v = value_for("--orders")?;
                config.orders = v.parse().map_err(|_| format!("bad --orders value: {v}"))?;
            }
            "--traders" => {
                let v = value_for("--traders")?;
                config.traders = v.parse().map_err(|_| format!("bad --traders value: {v}"))?;
            }
            "--seed" => {
                let v = value_for("--seed")?;
                config.seed = v.parse().map_err(|_| format!("bad --seed value: {v}"))?;
            }
            "--pin" => config.enable_pinning = true,
            "--log" => config.log_file = Some(value_for("--log")?.to_string()),
            "--help" => return Ok(None),
            other => return Err(format!("unknown option: {other}")),
        }
    }

    if config.traders != 1 {
        return Err("the SPSC pipeline supports exactly one trader thread (--traders 1)".into());
    }

    Ok(Some(config))
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config = match parse_args(&args) {
        Ok(Some(config)) => config,
        Ok(None) => {
            print_usage(&args[0]);
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("error: {msg}");
            print_usage(&args[0]);
            return ExitCode::FAILURE;
        }
    };

    println!("=== tickmill exchange simulator ===\n");
    println!("Configuration:");
    println!("  Orders:      {}", config.orders);
    println!("  Traders:     {}", config.traders);
    println!("  Seed:        {}", config.seed);
    println!(
        "  Pinning:     {}",
        if config.enable_pinning { "enabled" } else { "disabled" }
    );
    println!(
        "  Log file:    {}",
        config.log_file.as_deref().unwrap_or("none")
    );
    println!("  CPU cores:   {}\n", pinning::num_cores());

    let logger = match &config.log_file {
        Some(path) => match RingLogger::create(path) {
            Ok(logger) => Some(Arc::new(logger)),
            Err(err) => {
                eprintln!("error: failed to open log file {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let (producer, consumer) = queue::channel(DEFAULT_QUEUE_CAPACITY);

    let mut engine_config = EngineConfig::default();
    if config.enable_pinning && pinning::num_cores() > 1 {
        engine_config.pin_to_core = Some(0);
    }
    let mut engine = MatchingEngine::new(consumer, engine_config, logger.clone());

    let trader_config = TraderConfig {
        trader_id: TraderId(0),
        seed: config.seed,
        orders_to_generate: config.orders,
        pin_to_core: if config.enable_pinning && pinning::num_cores() > 1 {
            Some(1)
        } else {
            None
        },
        ..TraderConfig::default()
    };
    let mut trader = Trader::new(trader_config, producer, 1);

    let stop = Arc::new(AtomicBool::new(false));
    let start_time = now_ns();

    println!("Starting matching engine...");
    let engine_stop = Arc::clone(&stop);
    let engine_thread = thread::spawn(move || {
        engine.run(&engine_stop);
        engine
    });

    println!("Starting trader thread...");
    let trader_stop = Arc::clone(&stop);
    let trader_thread = thread::spawn(move || {
        trader.run(&trader_stop);
        trader
    });

    let trader = trader_thread.join().expect("trader thread panicked");
    let traders_done_time = now_ns();
    println!("Trader completed ({} orders sent).", trader.orders_sent());

    // Give the engine a moment to catch up, then stop; the run loop
    // drains whatever is still enqueued before returning.
    println!("Draining event queue...");
    thread::sleep(Duration::from_millis(100));
    stop.store(true, Ordering::Release);
    let engine = engine_thread.join().expect("engine thread panicked");

    let end_time = now_ns();
    let total_time_s = (end_time - start_time) as f64 / 1e9;
    let gen_time_s = (traders_done_time - start_time) as f64 / 1e9;

    println!("\n=== Performance Results ===");
    println!("Total time:         {total_time_s:.3} seconds");
    println!("Order gen time:     {gen_time_s:.3} seconds");
    println!("Orders processed:   {}", engine.events_processed());
    println!(
        "Throughput:         {} orders/second",
        (config.orders as f64 / total_time_s) as u64
    );

    println!("\n{}", engine.snapshot());

    let book = engine.book();
    println!("\n=== Final Book State ===");
    println!("  Active orders:  {}", book.order_count());
    println!("  Bid levels:     {}", book.bid_levels());
    println!("  Ask levels:     {}", book.ask_levels());
    if let Some(bid) = book.best_bid() {
        println!("  Best bid:       {bid}");
    }
    if let Some(ask) = book.best_ask() {
        println!("  Best ask:       {ask}");
    }
    if let Some(spread) = book.spread() {
        println!("  Spread:         {spread}");
    }

    if let Some(logger) = &logger {
        println!("\n=== Logging Stats ===");
        println!("  Messages logged:  {}", logger.messages_logged());
        println!("  Messages dropped: {}", logger.messages_dropped());
    }

    println!("\nSimulation complete.");
    ExitCode::SUCCESS
}
