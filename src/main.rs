use chrono::{Local, NaiveDate};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;

use tally::api::{ApiClient, Item};
use tally::balance::BalanceTracker;
use tally::cache::RangeStore;
use tally::config::Config;
use tally::range::{DateRange, RangePreset};
use tally::summary::{ItemSummary, SummaryEvent, SummaryState};

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Browse finance items and totals for a date range")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tally/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Named range to show
  #[arg(short, long, value_enum, conflicts_with_all = ["start", "end"])]
  preset: Option<RangePreset>,

  /// First day of a custom range (YYYY-MM-DD)
  #[arg(long)]
  start: Option<NaiveDate>,

  /// Last day of a custom range (YYYY-MM-DD)
  #[arg(long)]
  end: Option<NaiveDate>,

  /// Maximum number of pages to load
  #[arg(long, default_value_t = 1)]
  pages: u32,

  /// List endpoint to browse, overriding the config
  #[arg(long)]
  resource: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _log_guard = tally::logging::init(&config.log)?;

  let range = if args.start.is_some() || args.end.is_some() {
    DateRange::from_bounds(args.start, args.end)?
  } else {
    let preset = args.preset.unwrap_or(config.default_range);
    Some(preset.resolve(Local::now().date_naive()))
  };
  let resource = args.resource.unwrap_or(config.resource);

  let client = ApiClient::new(&config.api, Config::get_api_token())?;
  let store = RangeStore::new(client.clone());
  let balances = BalanceTracker::new(client, &resource);
  let (mut summary, mut events) = ItemSummary::new(store, balances, resource, range);

  summary.mount();
  summary.settle().await;
  check_failures(&mut events)?;

  let mut loaded = 1;
  while loaded < args.pages && summary.has_more() {
    summary.load_more();
    summary.settle().await;
    check_failures(&mut events)?;
    loaded += 1;
  }
  info!(pages = loaded, items = summary.items().len(), "done");

  print_summary(&summary);
  Ok(())
}

fn check_failures(events: &mut mpsc::UnboundedReceiver<SummaryEvent>) -> Result<()> {
  let failures = drain_failures(events);
  if failures.is_empty() {
    return Ok(());
  }
  Err(eyre!("{}", failures.join("\n")))
}

/// Describe every failure queued so far
fn drain_failures(events: &mut mpsc::UnboundedReceiver<SummaryEvent>) -> Vec<String> {
  let mut failures = Vec::new();
  while let Ok(event) = events.try_recv() {
    failures.push(match event {
      SummaryEvent::ItemsFailed { key, error } => format!("Failed to load {}: {}", key, error),
      SummaryEvent::BalanceFailed { range, error } => {
        format!("Failed to load balance for {}: {}", range, error)
      }
    });
  }
  failures
}

fn print_summary<C: tally::api::HttpGet>(summary: &ItemSummary<C>) {
  match summary.state() {
    SummaryState::NeedsRange => {
      println!("Pick a date range first (--preset, or both --start and --end).");
      return;
    }
    SummaryState::Empty => {
      println!("No items in this range yet.");
      return;
    }
    SummaryState::Loading | SummaryState::Loaded => {}
  }

  if let Some(range) = summary.range() {
    println!("{}", range);
  }
  if let Some(balance) = summary.balance() {
    println!(
      "income {}  expenses {}  net {}",
      format_amount(balance.income as i64),
      format_amount(balance.expenses as i64),
      format_amount(balance.balance)
    );
  }
  println!();

  for item in summary.items() {
    println!("{}", item_line(&item));
  }

  println!();
  if summary.has_more() {
    println!("More items available (use --pages).");
  } else {
    println!("No more items.");
  }
}

fn item_line(item: &Item) -> String {
  let (sign, name) = item
    .primary_tag()
    .map(|t| (t.sign.as_str(), t.name.as_str()))
    .unwrap_or(("$", "Uncategorized"));
  format!(
    "{} {:<16} {:>12}  {}",
    sign,
    name,
    format_amount(item.amount),
    item.happen_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
  )
}

fn format_amount(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let cents = cents.unsigned_abs();
  format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}
