use std::sync::Arc;

use clap::Parser;
use tgcdn_core::config::Config;
use tgcdn_core::kvcache::RedisCache;
use tgcdn_core::offload::{run_drainer, OffloadHandle};
use tgcdn_pipeline::{offload_executor, Resolver, Sweeper, Worker};
use tgcdn_server::{build_router, AppState};
use tgcdn_store::{build_pool, Store};
use tgcdn_upstream::HttpMessagingClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pool = build_pool(&config.database_url()).await?;
    let store = Store::new(pool);

    let cache = Arc::new(RedisCache::connect(&config.redis_url).await?);

    let mut bot_ids = Vec::with_capacity(config.sendbot_tokens.len());
    for token in &config.sendbot_tokens {
        let bot = store.bots.get_or_create(token).await?;
        bot_ids.push((bot.bot_id, token.clone()));
    }

    let upstream = Arc::new(HttpMessagingClient::new()?);

    let (offload, offload_rx) = OffloadHandle::new(config.offload_channel_capacity);
    let drainer_store = store.clone();
    let drainer_task = tokio::spawn(run_drainer(offload_rx, move |job| {
        let store = drainer_store.clone();
        async move { offload_executor::execute(&store, job).await }
    }));

    let mut worker_handles = Vec::with_capacity(bot_ids.len());
    for (bot_id, token) in &bot_ids {
        let worker = Worker::new(
            *bot_id,
            token.clone(),
            config.sendbot_chat_id,
            std::path::PathBuf::from(&config.temp_dir),
            config.worker_batch_size,
            config.worker_poll_interval(),
            store.clone(),
            upstream.clone(),
        );
        worker_handles.push(worker.spawn());
    }
    info!(worker_count = worker_handles.len(), "workers started");

    let stale_after = std::time::Duration::from_secs(config.gc_stale_after_secs.max(0) as u64);
    let sweeper = Sweeper::new(store.clone(), config.gc_interval(), stale_after).spawn();

    let resolver = Arc::new(Resolver::new(store.clone(), cache.clone(), upstream.clone(), offload.clone()));

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .connect_timeout(std::time::Duration::from_secs(30))
        .build()?;

    let config = Arc::new(config);
    let state = Arc::new(AppState {
        store,
        resolver,
        upstream,
        offload,
        config: config.clone(),
        http_client,
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(addr = %config.http_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    for handle in worker_handles {
        handle.stop().await;
    }
    sweeper.stop().await;
    // The router (and the offload handle clones it held) was dropped when
    // `axum::serve` returned above; the drainer now sees its channel
    // closed and exits on its own.
    let _ = drainer_task.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
