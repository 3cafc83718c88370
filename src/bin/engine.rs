//! Process entrypoint: wires the in-memory repository, the outbound
//! notifier, every queue, and every scheduled task together, then runs
//! until Ctrl-C. Grounded on `bin/auto-cancel.rs`'s startup sequence
//! (`tracing_subscriber` init -> `Config::load()` -> `config.log_summary()`
//! -> build collaborators -> run until shutdown).

use std::sync::Arc;

use paymatch_core::alipay::AlipayPoller;
use paymatch_core::confirm::FinalConfirmLoop;
use paymatch_core::db::memory::InMemoryRepository;
use paymatch_core::matcher::Matcher;
use paymatch_core::model::{Resource, Transfer, TradeType};
use paymatch_core::nonorder::NonOrderLoop;
use paymatch_core::queue;
use paymatch_core::rate::{NoAdjustment, RateAggregator};
use paymatch_core::resource_loop::ResourceLoop;
use paymatch_core::{Config, LoggingNotifier, TaskScheduler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let config = Config::load()?;
    config.log_summary();

    let repo = Arc::new(InMemoryRepository::new());
    let notifier = Arc::new(LoggingNotifier);

    let (transfer_tx, transfer_rx) = queue::unbounded::<Transfer>();
    let (nonorder_tx, nonorder_rx) = queue::unbounded::<Transfer>();
    let (_resource_tx, resource_rx) = queue::unbounded::<Resource>();

    let matcher = Matcher::new(
        repo.clone(),
        notifier.clone(),
        transfer_rx,
        nonorder_tx,
        config.payment_match_mode,
        config.batch_tick_interval,
        config.order_check_interval,
    );

    let nonorder_loop = NonOrderLoop::new(repo.clone(), repo.clone(), notifier.clone(), nonorder_rx, config.batch_tick_interval);

    let resource_loop = ResourceLoop::new(repo.clone(), repo.clone(), notifier.clone(), resource_rx, config.batch_tick_interval);

    let final_confirm_loop = FinalConfirmLoop::new(
        repo.clone(),
        notifier.clone(),
        TradeType::all().to_vec(),
        config.final_confirm_interval,
    );

    let alipay_poller = AlipayPoller::new(
        repo.clone(),
        repo.clone(),
        notifier.clone(),
        transfer_tx,
        config.alipay_poll_interval,
    );

    let rate_aggregator = RateAggregator::new(
        repo.clone(),
        Arc::new(NoAdjustment),
        config.coingecko_base_url.clone(),
        config.coingecko_api_key.clone(),
        config.rate_cryptos.clone(),
        config.rate_fiats.clone(),
        config.rate_poll_interval,
    );

    // Every task below owns its own internal periodic loop (each `run()`
    // ticks forever until cancelled), so each is registered as a single
    // long-running task rather than re-invoked by the scheduler itself.
    let mut scheduler = TaskScheduler::new();
    scheduler.register(std::time::Duration::ZERO, Arc::new(matcher));
    scheduler.register(std::time::Duration::ZERO, Arc::new(nonorder_loop));
    scheduler.register(std::time::Duration::ZERO, Arc::new(resource_loop));
    scheduler.register(std::time::Duration::ZERO, Arc::new(final_confirm_loop));
    scheduler.register(std::time::Duration::ZERO, Arc::new(alipay_poller));
    scheduler.register(std::time::Duration::ZERO, Arc::new(rate_aggregator));

    let root = CancellationToken::new();
    let handles = scheduler.start(root.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, cancelling tasks");
    root.cancel();

    for handle in handles {
        let _ = handle.await;
    }

    tracing::info!("engine stopped");
    Ok(())
}
