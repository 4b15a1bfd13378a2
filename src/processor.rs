use crate::{
    config::ProcessorConfig,
    database::{
        db_structs::{EventFilter, PlayerRecord, Server},
        source::{EventSource, SourceError}
    },
    model::stats_model::{aggregate, EventLog},
    store::{
        keys,
        publisher::{PublishError, SnapshotPublisher},
        SnapshotStore, StoreError
    }
};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Failed to read event log: {0}")]
    SourceError(#[from] SourceError),

    #[error("Failed to update pass markers or leaderboards: {0}")]
    StoreError(#[from] StoreError),

    #[error("Batches {failed:?} still failing after {attempts} attempts, first error: {first}")]
    PublishError {
        failed: Vec<usize>,
        attempts: u32,
        first: Box<PublishError>
    }
}

/// What a successful pass did.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub run_id: Uuid,
    pub server_ids: Vec<i32>,
    pub players: usize,
    pub events: usize,
    pub batches: usize,
    /// Retry rounds needed before every batch was written
    pub retries: u32,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration
}

/// Runs one full pass: read the log, rebuild every player from scratch and
/// publish the snapshot.
///
/// `updating` is set for the duration of the pass. Leaderboards are rebuilt
/// under staged keys and replace the live ones only once every batch has
/// been written, at which point `updating` is cleared and `lastUpdate`
/// stamped. If the
/// log cannot be read nothing is published and the flag is cleared again.
/// If batches still fail after the configured retries the flag is left set,
/// so readers can tell the snapshot is incomplete.
pub async fn run_pass<Src, St>(source: &Src, store: &St, config: &ProcessorConfig) -> Result<PassReport, ProcessorError>
where
    Src: EventSource,
    St: SnapshotStore
{
    let run_id = Uuid::new_v4();
    let span = info_span!("pass", %run_id);

    pass(run_id, source, store, config).instrument(span).await
}

async fn pass<Src, St>(
    run_id: Uuid,
    source: &Src,
    store: &St,
    config: &ProcessorConfig
) -> Result<PassReport, ProcessorError>
where
    Src: EventSource,
    St: SnapshotStore
{
    let start = Instant::now();
    let publisher = SnapshotPublisher::new(store, config.publish);

    publisher.mark_updating().await?;
    publisher.reset_staging().await?;
    info!("Pass started");

    let (servers, players, events) = match fetch(source, &config.event_filter).await {
        Ok(rows) => rows,
        Err(e) => {
            if let Err(clear_error) = store.delete(keys::UPDATING).await {
                warn!("Failed to clear updating flag: {}", clear_error);
            }

            return Err(e.into());
        }
    };

    let snapshot = aggregate(&players, &servers, &events, config.scheme, config.layer_filter.clone());

    let mut report = publisher.publish(&snapshot).await;
    let batches = report.attempted;
    let mut retries = 0;

    while !report.is_success() && retries < config.publish_retries {
        retries += 1;
        warn!(
            "Retrying {} failed batches (attempt {}/{})",
            report.failed.len(),
            retries,
            config.publish_retries
        );

        report = publisher.retry_failed(&snapshot, &report).await;
    }

    let failed = report.failed_indices();
    if let Some((_, first)) = report.failed.into_iter().next() {
        return Err(ProcessorError::PublishError {
            failed,
            attempts: retries + 1,
            first: Box::new(first)
        });
    }

    publisher.promote_leaderboards().await?;

    let finished_at = Utc::now();
    publisher.mark_updated(finished_at).await?;

    let duration = start.elapsed();
    info!(
        "Pass finished in {:?}: {} players, {} events, {} batches",
        duration,
        snapshot.players.len(),
        events.len(),
        batches
    );

    Ok(PassReport {
        run_id,
        server_ids: servers.iter().map(|s| s.id).collect(),
        players: snapshot.players.len(),
        events: events.len(),
        batches,
        retries,
        finished_at,
        duration
    })
}

async fn fetch<S: EventSource>(
    source: &S,
    filter: &EventFilter
) -> Result<(Vec<Server>, Vec<PlayerRecord>, EventLog), SourceError> {
    let start = Instant::now();

    let (servers, players, deaths, incaps, revives) = tokio::try_join!(
        source.list_servers(),
        source.list_players(),
        source.list_deaths(filter),
        source.list_incaps(filter),
        source.list_revives(filter)
    )?;

    debug!(
        "Fetched {} servers, {} players, {} deaths, {} incaps, {} revives in {:?}",
        servers.len(),
        players.len(),
        deaths.len(),
        incaps.len(),
        revives.len(),
        start.elapsed()
    );

    Ok((
        servers,
        players,
        EventLog {
            deaths,
            incaps,
            revives
        }
    ))
}
