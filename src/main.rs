//! Order Book Viewer - replay binary
//!
//! Replays a JSON-lines feed through a [`BookSession`] and prints the final
//! display ladder, the feed statistics and the book's state root.
//!
//! ```text
//! orderbook-viewer --symbol MSFT --window 20 feed.jsonl
//! RUST_LOG=debug orderbook-viewer < feed.jsonl
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use orderbook_viewer::feed::RecordReader;
use orderbook_viewer::{BookConfig, BookSession, DisplayRow, OrderEntry, OrderIdMode};

#[derive(Parser)]
#[clap(name = "orderbook-viewer")]
#[clap(about = "Replay an order-by-order feed and print the top of book")]
struct Cli {
    /// Feed file (JSON lines); reads stdin when omitted
    input: Option<PathBuf>,

    /// TOML configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Rows per side in the display window (overrides the config file)
    #[clap(short, long)]
    window: Option<usize>,

    /// Show the decoded order-id field instead of the feed key
    #[clap(long)]
    ascii_order_id: bool,

    /// Instrument being replayed
    #[clap(short, long, default_value = "FEED")]
    symbol: String,

    /// Rows to print (defaults to the whole window)
    #[clap(short, long)]
    rows: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening feed {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut session = BookSession::new(&config);
    session.subscribe(cli.symbol.clone());

    let mut bad_lines = 0u64;
    for record in RecordReader::new(input) {
        match record {
            Ok(mutation) => {
                // Book errors are counted and logged by the session
                let _ = session.process(&mutation);
            }
            Err(err) if err.line().is_some() => {
                bad_lines += 1;
                warn!(%err, "skipping feed line");
            }
            Err(err) => return Err(err).context("reading feed"),
        }
    }

    let stats = session.stats();
    info!(
        refreshes = stats.refreshes,
        updates = stats.updates,
        dropped = stats.dropped,
        rebuilds = stats.rebuilds,
        bad_lines,
        "replay complete"
    );

    print_ladder(&cli.symbol, &session, cli.rows.unwrap_or(config.window_size));

    let book = session.book();
    println!();
    println!("orders:     {} ({} bids, {} asks)", book.len(), book.bid_count(), book.ask_count());
    println!("refreshes:  {}", stats.refreshes);
    println!("updates:    {}", stats.updates);
    println!("dropped:    {}", stats.dropped);
    if let Some(elapsed) = stats.time_to_full_window() {
        println!("window full after {elapsed:?}");
    }
    println!("state root: {}", hex::encode(book.compute_state_root()));

    session.unsubscribe();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<BookConfig> {
    let mut config = match &cli.config {
        Some(path) => BookConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => BookConfig::default(),
    };
    if let Some(window) = cli.window {
        config.window_size = window;
    }
    if cli.ascii_order_id {
        config.order_id_mode = OrderIdMode::Field;
    }
    config.validate()?;
    Ok(config)
}

fn print_ladder(symbol: &str, session: &BookSession, rows: usize) {
    println!("{symbol}");
    println!(
        "{:>12} {:>10} {:>10} {:>10} | {:<10} {:<10} {:<10} {:<12}",
        "order", "mpid", "size", "bid", "ask", "size", "mpid", "order"
    );

    let printable = session.rows().into_iter().take(rows).filter(|row| !row.is_blank());
    for DisplayRow { bid, ask, .. } in printable {
        let (bid_id, bid_mpid, bid_size, bid_px) = cells(bid);
        let (ask_id, ask_mpid, ask_size, ask_px) = cells(ask);
        println!(
            "{bid_id:>12} {bid_mpid:>10} {bid_size:>10} {bid_px:>10} | {ask_px:<10} {ask_size:<10} {ask_mpid:<10} {ask_id:<12}"
        );
    }
}

fn cells(entry: Option<&OrderEntry>) -> (&str, &str, &str, &str) {
    match entry {
        Some(e) => (e.order_id(), e.participant(), e.display_size(), e.display_price()),
        None => ("", "", "", ""),
    }
}
