//! Command Line Interface for the AMM router.
use amm_router_domain::math::bin_price::{calculate_bin_price_range, get_bin_price, get_price_bin_id};
use amm_router_domain::{Amount, AssetId};
use amm_router_routing::prelude::*;
use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use prettytable::{Table, row};
use primitive_types::U256;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "amm-router")]
#[command(about = "Multi-hop AMM pricing and routing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Routing overrides layered on top of the environment.
#[derive(Args)]
struct RoutingArgs {
    /// JSON reserve snapshot
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Asset sold (0x-prefixed hex id)
    #[arg(long)]
    asset_in: String,

    /// Asset bought (0x-prefixed hex id)
    #[arg(long)]
    asset_out: String,

    /// Maximum pools per route
    #[arg(long)]
    max_hops: Option<usize>,

    /// Base asset used for indirect routes (repeatable)
    #[arg(long = "base-asset")]
    base_assets: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote the best route for a trade
    Quote {
        #[command(flatten)]
        routing: RoutingArgs,

        /// Amount in human units of the fixed side
        #[arg(short, long)]
        amount: Decimal,

        /// Fix the output amount instead of the input
        #[arg(long)]
        exact_out: bool,

        /// Slippage tolerance in basis points
        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// List every candidate route between two assets
    Routes {
        #[command(flatten)]
        routing: RoutingArgs,

        /// Quote each route for this input amount (human units)
        #[arg(short, long)]
        amount: Option<Decimal>,
    },
    /// Price of a bin, or the bin closest to a price
    BinPrice {
        /// Bin step in basis points
        #[arg(long)]
        bin_step: u32,

        /// Bin to price
        #[arg(long, allow_hyphen_values = true, conflicts_with = "price")]
        bin_id: Option<i32>,

        /// 1e18-scaled price to locate
        #[arg(long)]
        price: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Quote {
            routing,
            amount,
            exact_out,
            slippage_bps,
        } => run_quote(routing, amount, exact_out, slippage_bps).await,
        Commands::Routes { routing, amount } => run_routes(routing, amount).await,
        Commands::BinPrice {
            bin_step,
            bin_id,
            price,
        } => run_bin_price(bin_step, bin_id, price),
    }
}

fn load_config(routing: &RoutingArgs, slippage_bps: Option<u32>) -> Result<RouterConfig> {
    let mut config = RouterConfig::from_env()?;
    if let Some(max_hops) = routing.max_hops {
        config.max_hops = max_hops;
    }
    if !routing.base_assets.is_empty() {
        config.base_assets = parse_asset_list(&routing.base_assets.join(","))?;
    }
    if let Some(slippage_bps) = slippage_bps {
        config.slippage_bps = slippage_bps;
    }
    config.validate()?;
    Ok(config)
}

async fn load_snapshot(path: &Path) -> Result<PoolSnapshot> {
    let snapshot = FileSnapshotSource::new(path).fetch_snapshot(&[]).await?;
    Ok(snapshot)
}

fn parse_asset(raw: &str) -> Result<AssetId> {
    AssetId::from_str(raw).with_context(|| format!("invalid asset id '{raw}'"))
}

// unlisted assets are shown in base units
fn decimals_of(snapshot: &PoolSnapshot, asset: &AssetId) -> u8 {
    snapshot.asset(asset).map(|m| m.decimals).unwrap_or(0)
}

fn label(snapshot: &PoolSnapshot, asset: &AssetId) -> String {
    snapshot
        .asset(asset)
        .and_then(|m| m.symbol.clone())
        .unwrap_or_else(|| asset.to_string())
}

fn display(raw: U256, decimals: u8) -> String {
    Amount::new(raw, decimals)
        .to_decimal()
        .map(|d| d.to_string())
        .unwrap_or_else(|| raw.to_string())
}

async fn run_quote(
    routing: RoutingArgs,
    amount: Decimal,
    exact_out: bool,
    slippage_bps: Option<u32>,
) -> Result<()> {
    let config = load_config(&routing, slippage_bps)?;
    let asset_in = parse_asset(&routing.asset_in)?;
    let asset_out = parse_asset(&routing.asset_out)?;

    println!("📂 Loading snapshot from {}...", routing.snapshot.display());
    let snapshot = load_snapshot(&routing.snapshot).await?;
    let (dec_in, dec_out) = (
        decimals_of(&snapshot, &asset_in),
        decimals_of(&snapshot, &asset_out),
    );
    let (sym_in, sym_out) = (label(&snapshot, &asset_in), label(&snapshot, &asset_out));

    let request = if exact_out {
        TradeRequest::exact_out(asset_in, asset_out, Amount::from_decimal(amount, dec_out)?.raw)
    } else {
        TradeRequest::exact_in(asset_in, asset_out, Amount::from_decimal(amount, dec_in)?.raw)
    };

    let router = SwapRouter::new(Arc::new(StaticSnapshotSource::new(snapshot.clone())), config);
    println!("🔍 Searching routes ({} max hops)...", router.config().max_hops);
    let outcome = router
        .quote(request)
        .await?
        .ok_or_else(|| anyhow!("quote superseded"))?;

    let Some(trade) = outcome.trade else {
        println!("❌ {}", outcome.state);
        if let Some(error) = outcome.error {
            println!("   {error}");
        }
        return Ok(());
    };

    println!("\n📊 Best Route ({})", outcome.state);
    println!("════════════════════════════════════");
    println!("Route:      {}", trade.route);
    println!("Amount In:  {} {}", display(trade.amount_in, dec_in), sym_in);
    println!("Amount Out: {} {}", display(trade.amount_out, dec_out), sym_out);
    if let Some(summary) = router.summarize().await? {
        println!("Price:      {}", display(summary.effective_price, 18));
        println!("Impact:     {} bps", summary.price_impact_bps);
        println!("Fee:        {} {}", display(summary.fee, dec_in), sym_in);
        println!("Min Out:    {} {}", display(summary.min_amount_out, dec_out), sym_out);
        println!("Max In:     {} {}", display(summary.max_amount_in, dec_in), sym_in);
    }
    println!("════════════════════════════════════");

    let mut table = Table::new();
    table.add_row(row!["Pool", "Sell", "Amount In", "Buy", "Amount Out", "Fee"]);
    for hop in &trade.quote.hops {
        let (d_in, d_out) = (
            decimals_of(&snapshot, &hop.asset_in),
            decimals_of(&snapshot, &hop.asset_out),
        );
        table.add_row(row![
            hop.pool,
            hop.asset_in,
            display(hop.amount_in, d_in),
            hop.asset_out,
            display(hop.amount_out, d_out),
            display(hop.fee, d_in)
        ]);
    }
    table.printstd();
    Ok(())
}

async fn run_routes(routing: RoutingArgs, amount: Option<Decimal>) -> Result<()> {
    let config = load_config(&routing, None)?;
    let asset_in = parse_asset(&routing.asset_in)?;
    let asset_out = parse_asset(&routing.asset_out)?;
    let snapshot = load_snapshot(&routing.snapshot).await?;

    let pairs = build_candidate_pairs(asset_in, asset_out, &config.base_assets);
    let pools = snapshot.candidate_pools(&pairs);
    let routes = compute_all_routes(asset_in, asset_out, &pools, config.max_hops);
    println!(
        "✅ {} candidate pairs, {} pools, {} routes",
        pairs.len(),
        pools.len(),
        routes.len()
    );

    let quoter = Quoter::new(&snapshot, &config);
    let dec_out = decimals_of(&snapshot, &asset_out);
    let quotes: Vec<Option<amm_router_domain::Result<Quote>>> = match amount {
        Some(amount) => {
            let raw = Amount::from_decimal(amount, decimals_of(&snapshot, &asset_in))?.raw;
            quoter
                .quote_routes(&routes, raw, TradeType::ExactIn)
                .into_iter()
                .map(Some)
                .collect()
        }
        None => vec![None; routes.len()],
    };

    let mut table = Table::new();
    table.add_row(row!["#", "Hops", "Route", "Amount Out"]);
    for (i, (route, quote)) in routes.iter().zip(quotes).enumerate() {
        let out = match quote {
            Some(Ok(q)) => display(q.amount_out, dec_out),
            Some(Err(e)) => e.to_string(),
            None => "-".to_string(),
        };
        table.add_row(row![i + 1, route.hops(), route, out]);
    }
    table.printstd();
    Ok(())
}

fn run_bin_price(bin_step: u32, bin_id: Option<i32>, price: Option<String>) -> Result<()> {
    match (bin_id, price) {
        (Some(bin_id), _) => {
            let (lower, upper) = calculate_bin_price_range(bin_id, bin_step)?;
            println!("Bin {bin_id} (step {bin_step} bps)");
            println!("Price:  {}", display(get_bin_price(bin_id, bin_step)?, 18));
            println!("Range:  [{}, {})", display(lower, 18), display(upper, 18));
        }
        (None, Some(price)) => {
            let price = U256::from_dec_str(&price).map_err(|e| anyhow!("invalid price: {e:?}"))?;
            let bin_id = get_price_bin_id(price, bin_step)?;
            println!("Closest bin: {bin_id}");
            println!("Bin price:   {}", display(get_bin_price(bin_id, bin_step)?, 18));
        }
        (None, None) => return Err(anyhow!("either --bin-id or --price is required")),
    }
    Ok(())
}
