use clap::Parser;
use stats_processor::{
    args::Args,
    config::ProcessorConfig,
    database::DbClient,
    processor::{run_pass, PassReport},
    scheduler,
    store::{
        keys::{self, LeaderboardMetric, LeaderboardScope},
        MemoryStore, RedisStore, SnapshotStore
    }
};
use std::process;
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Entries logged per leaderboard on a dry run
const DRY_RUN_TOP: usize = 5;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = match ProcessorConfig::try_from(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let db = match DbClient::connect(&args.connection_string, config.tables.clone()).await {
        Ok(db) => db,
        Err(e) => {
            error!("{}", e);
            error!("Application cannot start without a valid database connection");
            process::exit(1);
        }
    };
    info!("Connected to event log database");

    if args.dry_run {
        dry_run(&db, &config).await;
        return;
    }

    let store = match RedisStore::connect(&args.redis_url).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to connect to Redis: {}", e);
            process::exit(1);
        }
    };

    if args.flush_on_start {
        if let Err(e) = store.flush().await {
            error!("Failed to flush Redis: {}", e);
            process::exit(1);
        }
    }

    if args.once {
        let result = run_pass(&db, &store, &config).await;
        store.close();

        if let Err(e) = result {
            error!("Pass failed: {}", e);
            process::exit(1);
        }

        return;
    }

    let summary = scheduler::run(&db, &store, &config, shutdown_signal()).await;
    info!("Ran {} passes, {} failed", summary.passes, summary.failures);

    store.close();
}

fn init_logging(level: &str) {
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

/// Resolves on Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {}
    }
}

/// One pass into an in-process store, then a summary of what would have
/// been published.
async fn dry_run(db: &DbClient, config: &ProcessorConfig) {
    let store = MemoryStore::new();

    let report = match run_pass(db, &store, config).await {
        Ok(report) => report,
        Err(e) => {
            error!("Pass failed: {}", e);
            process::exit(1);
        }
    };

    info!(
        "Dry run {}: {} players over {} servers in {} batches",
        report.run_id,
        report.players,
        report.server_ids.len(),
        report.batches
    );

    for key in rating_keys(&report, config.publish.scope) {
        let top = store.zrevrange(&key);

        for (rank, (steam_id, score)) in top.iter().take(DRY_RUN_TOP).enumerate() {
            info!("{} #{}: {} ({:.1})", key, rank + 1, steam_id, score);
        }
    }
}

fn rating_keys(report: &PassReport, scope: LeaderboardScope) -> Vec<String> {
    match scope {
        LeaderboardScope::Server => report
            .server_ids
            .iter()
            .map(|id| keys::server_leaderboard_key(*id, LeaderboardMetric::Rating))
            .collect(),
        LeaderboardScope::Global => vec![keys::global_leaderboard_key(LeaderboardMetric::Rating)]
    }
}
