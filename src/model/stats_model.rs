use crate::{
    database::db_structs::{Death, Incap, PlayerRecord, Revive, Server},
    model::{
        event_folder::{add_death, add_incap, add_revive, FilterReason, FoldOutcome, LayerFilter, PlayersMap},
        structures::{player::Player, rating_scheme::RatingScheme}
    },
    utils::progress_utils::{advance, track}
};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, info_span, Span};

// Events folded between progress updates
const PROGRESS_CHUNK: usize = 10_000;

/// Every event of one pass, as read from the source.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub deaths: Vec<Death>,
    pub incaps: Vec<Incap>,
    pub revives: Vec<Revive>
}

impl EventLog {
    pub fn len(&self) -> usize {
        self.deaths.len() + self.incaps.len() + self.revives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to the events of a pass. Only used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldSummary {
    pub applied: usize,
    pub ignored_layer: usize,
    pub missing_actor: usize,
    /// Sides (not events) that referenced an unknown player or server
    pub unresolved_sides: usize
}

impl FoldSummary {
    fn record(&mut self, outcome: FoldOutcome) {
        match outcome {
            FoldOutcome::Applied { first, second } => {
                self.applied += 1;
                self.unresolved_sides += usize::from(!first) + usize::from(!second);
            }
            FoldOutcome::Filtered(FilterReason::IgnoredLayer) => self.ignored_layer += 1,
            FoldOutcome::Filtered(FilterReason::MissingActor) => self.missing_actor += 1
        }
    }
}

/// The aggregation engine. Owns the player map of a single pass: built from
/// stubs, mutated by folding, then frozen into a [`Snapshot`].
pub struct StatsModel {
    scheme: RatingScheme,
    layer_filter: LayerFilter,
    players: PlayersMap,
    summary: FoldSummary
}

impl StatsModel {
    /// Stubs every player with one zeroed stat per server. Player order
    /// follows `players`, which keeps batch partitioning reproducible.
    pub fn new(
        players: &[PlayerRecord],
        servers: &[Server],
        scheme: RatingScheme,
        layer_filter: LayerFilter
    ) -> StatsModel {
        let start = Instant::now();
        let mut map = PlayersMap::with_capacity(players.len());

        for record in players {
            map.insert(record.steam_id.clone(), Player::stub(record, servers));
        }

        debug!(
            "Stubbed {} players across {} servers in {:?}",
            map.len(),
            servers.len(),
            start.elapsed()
        );

        StatsModel {
            scheme,
            layer_filter,
            players: map,
            summary: FoldSummary::default()
        }
    }

    pub fn fold(&mut self, events: &EventLog) {
        let start = Instant::now();
        let span = info_span!("folding events");
        track(&span, events.len() as u64);
        let _enter = span.enter();

        self.fold_deaths(&events.deaths, &span);
        self.fold_incaps(&events.incaps, &span);
        self.fold_revives(&events.revives, &span);

        debug!("Folded {} events in {:?}: {:?}", events.len(), start.elapsed(), self.summary);
    }

    fn fold_deaths(&mut self, deaths: &[Death], span: &Span) {
        for chunk in deaths.chunks(PROGRESS_CHUNK) {
            for death in chunk {
                let outcome = add_death(&mut self.players, &self.layer_filter, death);
                self.summary.record(outcome);
            }

            advance(span, chunk.len() as u64);
        }
    }

    fn fold_incaps(&mut self, incaps: &[Incap], span: &Span) {
        for chunk in incaps.chunks(PROGRESS_CHUNK) {
            for incap in chunk {
                let outcome = add_incap(&mut self.players, &self.layer_filter, incap);
                self.summary.record(outcome);
            }

            advance(span, chunk.len() as u64);
        }
    }

    fn fold_revives(&mut self, revives: &[Revive], span: &Span) {
        for chunk in revives.chunks(PROGRESS_CHUNK) {
            for revive in chunk {
                let outcome = add_revive(&mut self.players, &self.layer_filter, revive);
                self.summary.record(outcome);
            }

            advance(span, chunk.len() as u64);
        }
    }

    /// Derives ratios, ratings and match counts for every player and
    /// freezes the result.
    pub fn finalize(mut self) -> Snapshot {
        let start = Instant::now();
        let scheme = self.scheme;

        self.players.par_values_mut().for_each(|player| player.finalize(&scheme));

        debug!("Derived metrics for {} players in {:?}", self.players.len(), start.elapsed());

        Snapshot {
            scheme,
            summary: self.summary,
            players: self.players.into_values().collect()
        }
    }

    pub fn players(&self) -> &PlayersMap {
        &self.players
    }
}

/// A contiguous slice of the snapshot, published as one unit.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    pub index: usize,
    pub players: &'a [Player]
}

/// The finalized result of a pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub scheme: RatingScheme,
    pub summary: FoldSummary,
    pub players: Vec<Player>
}

impl Snapshot {
    /// Splits the players into batches of at most `batch_size`.
    /// A `batch_size` of 0 is treated as 1.
    pub fn batches(&self, batch_size: usize) -> Vec<Batch<'_>> {
        self.players
            .chunks(batch_size.max(1))
            .enumerate()
            .map(|(index, players)| Batch { index, players })
            .collect()
    }

    pub fn player(&self, steam_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.steam_id == steam_id)
    }
}

/// Runs the whole engine over one set of source rows.
pub fn aggregate(
    players: &[PlayerRecord],
    servers: &[Server],
    events: &EventLog,
    scheme: RatingScheme,
    layer_filter: LayerFilter
) -> Snapshot {
    let mut model = StatsModel::new(players, servers, scheme, layer_filter);
    model.fold(events);

    let snapshot = model.finalize();
    info!(
        "Aggregated {} players from {} events ({} applied, {} ignored layer, {} missing actor, {} unresolved sides)",
        snapshot.players.len(),
        events.len(),
        snapshot.summary.applied,
        snapshot.summary.ignored_layer,
        snapshot.summary.missing_actor,
        snapshot.summary.unresolved_sides
    );

    snapshot
}
