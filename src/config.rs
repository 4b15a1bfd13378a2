use crate::{
    args::Args,
    database::{db::TableNames, db_structs::EventFilter},
    model::{
        event_folder::LayerFilter,
        structures::rating_scheme::RatingScheme
    },
    store::publisher::PublishOptions
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Batch size must be at least 1")]
    ZeroBatchSize,

    #[error("Update interval must be at least 1ms")]
    ZeroInterval,

    #[error("Invalid season start '{value}': {reason}")]
    InvalidSeasonStart { value: String, reason: String },

    #[error("Contribution threshold must be positive, got {0}")]
    InvalidThreshold(f64)
}

/// Everything a pass needs, validated once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    pub tables: TableNames,
    pub event_filter: EventFilter,
    pub scheme: RatingScheme,
    pub layer_filter: LayerFilter,
    pub publish: PublishOptions,
    pub publish_retries: u32,
    pub update_interval: Duration
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            tables: TableNames::default(),
            event_filter: EventFilter::default(),
            scheme: RatingScheme::default(),
            layer_filter: LayerFilter::default(),
            publish: PublishOptions::default(),
            publish_retries: 2,
            update_interval: Duration::from_millis(300_000)
        }
    }
}

impl TryFrom<&Args> for ProcessorConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        if args.redis_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        if args.update_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        if let Some(threshold) = args.contribution_threshold {
            if threshold.is_nan() || threshold <= 0.0 {
                return Err(ConfigError::InvalidThreshold(threshold));
            }
        }

        let since = args.season_start.as_deref().map(parse_season_start).transpose()?;

        Ok(ProcessorConfig {
            tables: TableNames {
                servers: args.table_servers.clone(),
                players: args.table_players.clone(),
                matches: args.table_matches.clone(),
                deaths: args.table_deaths.clone(),
                incaps: args.table_incaps.clone(),
                revives: args.table_revives.clone()
            },
            event_filter: EventFilter {
                server_id: args.server_id,
                since
            },
            scheme: args.rating_scheme.with_threshold(args.contribution_threshold),
            layer_filter: LayerFilter::from_csv(&args.layers_to_ignore),
            publish: PublishOptions {
                batch_size: args.redis_batch_size,
                matches_minimum: args.matches_minimum,
                scope: args.leaderboard_scope
            },
            publish_retries: args.publish_retries,
            update_interval: Duration::from_millis(args.update_interval)
        })
    }
}

fn parse_season_start(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ConfigError::InvalidSeasonStart {
            value: value.to_string(),
            reason: e.to_string()
        })
}
