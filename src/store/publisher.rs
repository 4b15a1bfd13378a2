use super::{
    keys::{self, LeaderboardMetric, LeaderboardScope},
    SnapshotStore, StoreError, StoreOp
};
use crate::{
    model::{
        stats_model::{Batch, Snapshot},
        structures::{
            player::{Player, PlayerServerStat},
            rating_scheme::RatingScheme
        }
    },
    utils::progress_utils::{advance, track}
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use itertools::Itertools;
use std::time::Instant;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to serialize player {steam_id}: {source}")]
    SerializationError {
        steam_id: String,
        #[source]
        source: serde_json::Error
    },

    #[error("Failed to write batch: {0}")]
    StoreError(#[from] StoreError)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishOptions {
    pub batch_size: usize,
    /// Stats with fewer matches are stored but left off the leaderboards
    pub matches_minimum: u32,
    pub scope: LeaderboardScope
}

impl Default for PublishOptions {
    fn default() -> Self {
        PublishOptions {
            batch_size: 100,
            matches_minimum: 10,
            scope: LeaderboardScope::Server
        }
    }
}

/// Outcome of publishing a set of batches. Failures are keyed by batch index
/// so they can be retried with [`SnapshotPublisher::retry_failed`].
#[derive(Debug, Default)]
pub struct PublishReport {
    pub attempted: usize,
    pub failed: Vec<(usize, PublishError)>
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed.len()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed.iter().map(|(index, _)| *index).collect()
    }
}

/// Writes a [`Snapshot`] into a [`SnapshotStore`], one atomic write per batch.
pub struct SnapshotPublisher<'a, S> {
    store: &'a S,
    options: PublishOptions
}

impl<'a, S: SnapshotStore> SnapshotPublisher<'a, S> {
    pub fn new(store: &'a S, options: PublishOptions) -> SnapshotPublisher<'a, S> {
        SnapshotPublisher { store, options }
    }

    pub async fn publish(&self, snapshot: &Snapshot) -> PublishReport {
        let batches = snapshot.batches(self.options.batch_size);
        self.publish_batches(batches, &snapshot.scheme).await
    }

    /// Publishes again only the batches that failed in `report`.
    pub async fn retry_failed(&self, snapshot: &Snapshot, report: &PublishReport) -> PublishReport {
        let failed = report.failed_indices();
        let batches = snapshot
            .batches(self.options.batch_size)
            .into_iter()
            .filter(|batch| failed.contains(&batch.index))
            .collect();

        self.publish_batches(batches, &snapshot.scheme).await
    }

    async fn publish_batches(&self, batches: Vec<Batch<'_>>, scheme: &RatingScheme) -> PublishReport {
        let start = Instant::now();
        let attempted = batches.len();

        let span = info_span!("publishing batches");
        track(&span, attempted as u64);
        let span = &span;

        let results = join_all(batches.into_iter().map(|batch| async move {
            let result = self.publish_batch(batch, scheme).await;
            advance(span, 1);

            (batch.index, result)
        }))
        .await;

        let failed: Vec<(usize, PublishError)> = results
            .into_iter()
            .filter_map(|(index, result)| result.err().map(|e| (index, e)))
            .collect();

        for (index, error) in &failed {
            warn!("Batch {} failed: {}", index, error);
        }

        info!(
            "Published {}/{} batches in {:?}",
            attempted - failed.len(),
            attempted,
            start.elapsed()
        );

        PublishReport { attempted, failed }
    }

    async fn publish_batch(&self, batch: Batch<'_>, scheme: &RatingScheme) -> Result<(), PublishError> {
        let ops = self.batch_ops(&batch, scheme)?;
        self.store.write_batch(&ops).await?;

        debug!("Batch {}: {} players, {} writes", batch.index, batch.players.len(), ops.len());

        Ok(())
    }

    /// Every write needed to publish `batch`: the stats record and name index
    /// entry of each player, plus one staged leaderboard entry per metric for
    /// each stat that meets the match minimum.
    pub fn batch_ops(&self, batch: &Batch<'_>, scheme: &RatingScheme) -> Result<Vec<StoreOp>, PublishError> {
        let mut ops = Vec::new();

        for player in batch.players {
            let value = serde_json::to_string(player).map_err(|source| PublishError::SerializationError {
                steam_id: player.steam_id.clone(),
                source
            })?;

            ops.push(StoreOp::HashSet {
                key: keys::STATS.to_string(),
                field: player.steam_id.clone(),
                value
            });
            ops.push(StoreOp::HashSet {
                key: keys::PLAYERS.to_string(),
                field: player.name.clone(),
                value: player.steam_id.clone()
            });

            self.leaderboard_ops(player, scheme, &mut ops);
        }

        Ok(ops)
    }

    fn leaderboard_ops(&self, player: &Player, scheme: &RatingScheme, ops: &mut Vec<StoreOp>) {
        match self.options.scope {
            LeaderboardScope::Server => {
                for stat in player.servers.values().sorted_by_key(|s| s.id) {
                    if self.is_ranked(stat) {
                        push_metrics(ops, &player.steam_id, stat, |m| {
                            keys::staged(&keys::server_leaderboard_key(stat.id, m))
                        });
                    }
                }
            }
            LeaderboardScope::Global => {
                let totals = player.totals(scheme);
                if self.is_ranked(&totals) {
                    push_metrics(ops, &player.steam_id, &totals, |m| {
                        keys::staged(&keys::global_leaderboard_key(m))
                    });
                }
            }
        }
    }

    /// Stats without a single match never rank, whatever the minimum.
    fn is_ranked(&self, stat: &PlayerServerStat) -> bool {
        stat.match_count > 0 && stat.match_count >= self.options.matches_minimum
    }

    /// Drops staged leaderboards left behind by a pass that did not finish.
    pub async fn reset_staging(&self) -> Result<(), StoreError> {
        let leftover = self.store.keys(&keys::pattern(keys::STAGING)).await?;

        for key in &leftover {
            self.store.delete(key).await?;
        }

        if !leftover.is_empty() {
            info!("Dropped {} staged keys from an unfinished pass", leftover.len());
        }

        Ok(())
    }

    /// Replaces the live leaderboards with the ones staged by this pass.
    /// Live leaderboards nothing was staged for are deleted, so entries from
    /// earlier data never outlive the pass that stopped ranking them.
    pub async fn promote_leaderboards(&self) -> Result<(), StoreError> {
        let staged = self.store.keys(&keys::pattern(&keys::staged(keys::LEADERBOARD))).await?;
        let live = self.store.keys(&keys::pattern(keys::LEADERBOARD)).await?;

        let renames: Vec<(String, String)> = staged
            .iter()
            .filter_map(|key| keys::unstaged(key).map(|target| (key.clone(), target.to_string())))
            .collect();
        let stale: Vec<String> = live
            .into_iter()
            .filter(|key| !renames.iter().any(|(_, target)| target == key))
            .collect();

        self.store.swap(&renames, &stale).await?;
        debug!("Promoted {} leaderboards, removed {}", renames.len(), stale.len());

        Ok(())
    }

    pub async fn mark_updating(&self) -> Result<(), StoreError> {
        self.store.set(keys::UPDATING, "true").await
    }

    /// Clears the `updating` flag and stamps `lastUpdate` in epoch millis.
    pub async fn mark_updated(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.store.delete(keys::UPDATING).await?;
        self.store
            .set(keys::LAST_UPDATE, &at.timestamp_millis().to_string())
            .await
    }
}

fn push_metrics(
    ops: &mut Vec<StoreOp>,
    steam_id: &str,
    stat: &PlayerServerStat,
    key: impl Fn(LeaderboardMetric) -> String
) {
    for metric in LeaderboardMetric::iter() {
        ops.push(StoreOp::SortedSetAdd {
            key: key(metric),
            member: steam_id.to_string(),
            score: metric.score(stat)
        });
    }
}
