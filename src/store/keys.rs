use crate::model::structures::player::PlayerServerStat;
use strum_macros::{AsRefStr, EnumIter};

/// Hash of player id -> serialized player
pub const STATS: &str = "stats";
/// Hash of display name -> player id, for name search with HSCAN
pub const PLAYERS: &str = "players";
pub const LEADERBOARD: &str = "leaderboard";
pub const LAST_UPDATE: &str = "lastUpdate";
pub const UPDATING: &str = "updating";
/// Prefix of leaderboards being rebuilt by a pass, renamed over the live
/// keys once every batch is written
pub const STAGING: &str = "staging";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum LeaderboardMetric {
    Matches,
    Rating,
    Kills,
    Deaths,
    Incaps,
    /// Kill efficiency
    Ke,
    Falls,
    /// Death efficiency
    De,
    Revives,
    Revived,
    Kdr,
    Idr,
    Tks,
    Tkd
}

impl LeaderboardMetric {
    pub fn score(&self, stat: &PlayerServerStat) -> f64 {
        match self {
            LeaderboardMetric::Matches => stat.match_count as f64,
            LeaderboardMetric::Rating => stat.rating,
            LeaderboardMetric::Kills => stat.kills as f64,
            LeaderboardMetric::Deaths => stat.deaths as f64,
            LeaderboardMetric::Incaps => stat.incaps as f64,
            LeaderboardMetric::Ke => stat.ke,
            LeaderboardMetric::Falls => stat.falls as f64,
            LeaderboardMetric::De => stat.de,
            LeaderboardMetric::Revives => stat.revives as f64,
            LeaderboardMetric::Revived => stat.revived as f64,
            LeaderboardMetric::Kdr => stat.kdr,
            LeaderboardMetric::Idr => stat.idr,
            LeaderboardMetric::Tks => stat.tks as f64,
            LeaderboardMetric::Tkd => stat.tkd as f64
        }
    }
}

/// Whether leaderboards are kept per server or across all servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum LeaderboardScope {
    /// `leaderboard:{serverId}:{metric}`
    #[default]
    Server,
    /// `leaderboard:{metric}`, scored on the player's summed stats
    Global
}

pub fn server_leaderboard_key(server_id: i32, metric: LeaderboardMetric) -> String {
    format!("{}:{}:{}", LEADERBOARD, server_id, metric.as_ref())
}

pub fn global_leaderboard_key(metric: LeaderboardMetric) -> String {
    format!("{}:{}", LEADERBOARD, metric.as_ref())
}

/// Where `key` is written while a pass is rebuilding it
pub fn staged(key: &str) -> String {
    format!("{}:{}", STAGING, key)
}

/// The live key a staged key is promoted to
pub fn unstaged(key: &str) -> Option<&str> {
    key.strip_prefix(STAGING).and_then(|rest| rest.strip_prefix(':'))
}

/// Glob matching every key under `prefix`
pub fn pattern(prefix: &str) -> String {
    format!("{}:*", prefix)
}
