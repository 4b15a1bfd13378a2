pub mod constants;
pub mod derived;
pub mod event_folder;
pub mod rating;
pub mod stats_model;
pub mod structures;

pub use event_folder::{LayerFilter, PlayersMap};
pub use stats_model::{aggregate, Batch, EventLog, Snapshot, StatsModel};
pub use structures::{
    player::{Player, PlayerServerStat},
    rating_scheme::{RatingScheme, RatingSchemeKind}
};
