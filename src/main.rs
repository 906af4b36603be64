use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use updown_rs::chain::{AlloyMarket, AlloyOracle, AlloyWallet};
use updown_rs::clock::SystemClock;
use updown_rs::config::Config;
use updown_rs::events::Event;
use updown_rs::feeds::oracle;
use updown_rs::scheduler::format_countdown;
use updown_rs::session::Session;
use updown_rs::state::{PriceHistory, PricePoint};
use updown_rs::strategy::calc_split;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cfg = Config::load("config.toml")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.general.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(?cfg, "loaded config");

    let wallet = AlloyWallet::connect_http(
        cfg.network.rpc_url.parse()?,
        cfg.credentials.private_key.as_deref(),
    )?;
    let mut session: Session<_, AlloyMarket> = Session::new(wallet.clone(), cfg.network.chain_id);
    let account = match session.connect().await {
        Ok(account) => account,
        Err(e) => {
            warn!(error = %e, "{}", e.user_message());
            return Ok(());
        }
    };

    // Create the event channel
    let (tx, mut rx) = mpsc::channel::<Event>(100);

    let market = Arc::new(wallet.market(cfg.network.contract_address));
    let vm = session.open(market, Arc::new(SystemClock), cfg.scheduler(), tx.clone())?;
    info!(%account, "watching market");

    // Live price feed, display only
    let oracle_task = match &cfg.oracle {
        Some(o) => {
            let feed = AlloyOracle::connect_http(o.rpc_url.parse()?, o.feed_address);
            Some(oracle::spawn(feed, o.poll_every(), tx.clone()))
        }
        None => None,
    };

    let shutdown = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown.send(Event::Shutdown).await;
        }
    });
    drop(tx);

    let mut history = PriceHistory::new();
    let mut last_remaining = None;

    info!("starting event loop (Ctrl+C to quit)");
    while let Some(event) = rx.recv().await {
        match event {
            Event::Refreshed => {
                let Some(view) = vm.view() else { continue };
                let snap = &view.snapshot;
                let split = calc_split(snap.total_up_stake, snap.total_down_stake);
                let perms = vm.permissions();
                info!(
                    phase = snap.phase().label(),
                    start_price = %snap.start_price,
                    price = %snap.display_price(),
                    pool = %snap.total_pool(),
                    up_pct = %split.up_pct,
                    down_pct = %split.down_pct,
                    prize_pool = %snap.contract_balance,
                    price_change_pct = %snap.price_change_pct().round_dp(2),
                    result = snap.result_label().unwrap_or("-"),
                    you = view.position.round_result(snap).map_or("-", |r| r.label()),
                    "market"
                );
                info!(
                    up = %view.position.up_stake,
                    down = %view.position.down_stake,
                    claimed = view.position.claimed,
                    "your bets"
                );
                info!(permissions = %serde_json::to_string(&perms)?, "controls");
            }
            Event::RefreshFailed { reason } => {
                warn!(%reason, "showing last known market state");
            }
            Event::Countdown { remaining_secs } => {
                let live = vm.view().is_some_and(|v| v.snapshot.is_live());
                if live && last_remaining != Some(remaining_secs) {
                    info!(remaining = %format_countdown(remaining_secs), "time remaining");
                }
                last_remaining = Some(remaining_secs);
            }
            Event::OraclePrice { price, at_ms } => {
                history.push(at_ms, price);
                info!(
                    %price,
                    at = %PricePoint { at_ms, price }.time_label(),
                    change_pct = %history.change_pct().round_dp(2),
                    "ETH/USD"
                );
            }
            Event::Shutdown => {
                info!("shutting down...");
                break;
            }
        }
    }

    session.disconnect();
    if let Some(task) = oracle_task {
        task.abort();
    }
    Ok(())
}
