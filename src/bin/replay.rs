//! Replay recorded order flow from a CSV file through a standalone
//! book and print the per-event result codes.

use std::process::ExitCode;

use tickmill::accounts::Accounts;
use tickmill::order_book::OrderBook;
use tickmill::replay::load_csv;
use tickmill::time::now_ns;
use tickmill::types::EventKind;

fn print_usage(program: &str) {
    println!("Usage: {program} <csv_file>");
    println!();
    println!("CSV Format:");
    println!("  type,order_id,trader_id,side,price,qty");
    println!("  L,1,0,B,10000,100    (NewLimit Buy)");
    println!("  L,2,1,S,10100,50     (NewLimit Sell)");
    println!("  X,3,0,B,,25          (NewMarket)");
    println!("  C,1,,,,              (Cancel)");
    println!("  M,2,,,,75            (Modify qty)");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        print_usage(&args[0]);
        return ExitCode::FAILURE;
    };

    println!("Reading orders from: {path}");
    let rows = match load_csv(path) {
        Ok(rows) => rows,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("Parsed {} orders\n", rows.len());

    let book = OrderBook::new(100_000, 1024);
    let accounts = Accounts::new(100);

    book.set_trade_sink(|trade| {
        println!(
            "  TRADE: {} @ {} (maker={}, taker={})",
            trade.qty, trade.price, trade.maker_order_id, trade.taker_order_id
        );
    });

    let start = now_ns();

    for row in &rows {
        // Accounts exist purely so balances could be inspected; the
        // replay path applies rows straight to the book.
        accounts.get_or_create(row.trader_id, 1_000_000_000);

        let response = match row.kind {
            EventKind::NewLimit => {
                println!(
                    "ADD LIMIT: id={} {} {} @ {}",
                    row.order_id, row.side, row.qty, row.price
                );
                book.add_limit(row.order_id, row.trader_id, row.side, row.price, row.qty)
            }
            EventKind::NewMarket => {
                println!("ADD MARKET: id={} {} {}", row.order_id, row.side, row.qty);
                book.add_market(row.order_id, row.trader_id, row.side, row.qty)
            }
            EventKind::Cancel => {
                println!("CANCEL: id={}", row.order_id);
                book.cancel(row.order_id)
            }
            EventKind::Modify => {
                println!("MODIFY: id={} new_qty={}", row.order_id, row.qty);
                book.modify(row.order_id, row.qty, row.price)
            }
        };

        println!("  -> {}", response.result);
    }

    let elapsed_ms = (now_ns() - start) as f64 / 1e6;

    println!("\n=== Replay Summary ===");
    println!("Orders processed: {}", rows.len());
    println!("Trades executed:  {}", book.trade_count());
    println!("Trade volume:     {}", book.total_volume());
    println!("Elapsed time:     {elapsed_ms:.3} ms");

    println!("\n=== Final Book State ===");
    println!("Active orders: {}", book.order_count());
    println!("Bid levels:    {}", book.bid_levels());
    println!("Ask levels:    {}", book.ask_levels());
    if let Some(bid) = book.best_bid() {
        println!("Best bid:      {bid}");
    }
    if let Some(ask) = book.best_ask() {
        println!("Best ask:      {ask}");
    }
    if let Some(spread) = book.spread() {
        println!("Spread:        {spread}");
    }

    ExitCode::SUCCESS
}
