use crate::{
    database::db_structs::{Death, Incap, Revive},
    model::structures::player::{Player, PlayerServerStat}
};
use indexmap::IndexMap;

/// Layers whose events are never counted (seeding, training, jensens...).
/// Matching is a case-insensitive substring test against every term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerFilter {
    terms: Vec<String>
}

impl LayerFilter {
    pub fn new<I, S>(terms: I) -> LayerFilter
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        LayerFilter {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        }
    }

    /// Parses a comma separated list, e.g. `"seed,jensen"`
    pub fn from_csv(csv: &str) -> LayerFilter {
        LayerFilter::new(csv.split(','))
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn should_ignore(&self, layer: &str) -> bool {
        let layer = layer.to_lowercase();
        self.terms.iter().any(|term| layer.contains(term.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterReason {
    /// No layer, or the layer is on the ignore list
    IgnoredLayer,
    /// One of the two actors is missing from the event
    MissingActor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    /// Which sides resolved to a known player on a known server
    Applied { first: bool, second: bool },
    Filtered(FilterReason)
}

impl FoldOutcome {
    /// True when the event passed the filter but neither side resolved
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            FoldOutcome::Applied {
                first: false,
                second: false
            }
        )
    }
}

pub type PlayersMap = IndexMap<String, Player>;

fn check<'a>(
    filter: &LayerFilter,
    layer: Option<&str>,
    first: Option<&'a str>,
    second: Option<&'a str>
) -> Result<(&'a str, &'a str), FilterReason> {
    match layer {
        Some(layer) if !layer.is_empty() && !filter.should_ignore(layer) => {}
        _ => return Err(FilterReason::IgnoredLayer)
    }

    match (first, second) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(FilterReason::MissingActor)
    }
}

/// Applies `update` to the stat of `player_id` on `server_id`, recording the
/// match. Returns false when either the player or the server is unknown.
fn apply<F>(players: &mut PlayersMap, player_id: &str, server_id: i32, match_id: i32, update: F) -> bool
where
    F: FnOnce(&mut PlayerServerStat)
{
    match players.get_mut(player_id).and_then(|p| p.server_mut(server_id)) {
        Some(stat) => {
            stat.record_match(match_id);
            update(stat);
            true
        }
        None => false
    }
}

/// Folds a death into the killer's and the victim's counters.
pub fn add_death(players: &mut PlayersMap, filter: &LayerFilter, death: &Death) -> FoldOutcome {
    let (attacker, victim) = match check(
        filter,
        death.layer.as_deref(),
        death.attacker.as_deref(),
        death.victim.as_deref()
    ) {
        Ok(actors) => actors,
        Err(reason) => return FoldOutcome::Filtered(reason)
    };

    let first = apply(players, attacker, death.server, death.match_id, |stat| {
        if death.teamkill {
            stat.tks += 1;
        } else {
            stat.kills += 1;
        }
    });

    let second = apply(players, victim, death.server, death.match_id, |stat| {
        stat.deaths += 1;

        if death.teamkill {
            stat.tkd += 1;
        }
    });

    FoldOutcome::Applied { first, second }
}

/// Folds an incap. Team-kill incaps give the attacker nothing but still
/// count as a fall for the victim.
pub fn add_incap(players: &mut PlayersMap, filter: &LayerFilter, incap: &Incap) -> FoldOutcome {
    let (attacker, victim) = match check(
        filter,
        incap.layer.as_deref(),
        incap.attacker.as_deref(),
        incap.victim.as_deref()
    ) {
        Ok(actors) => actors,
        Err(reason) => return FoldOutcome::Filtered(reason)
    };

    let first = apply(players, attacker, incap.server, incap.match_id, |stat| {
        if !incap.teamkill {
            stat.incaps += 1;
            stat.damage += incap.damage.map_or(0, |d| d.max(0.0).round() as u64);
        }
    });

    let second = apply(players, victim, incap.server, incap.match_id, |stat| {
        stat.falls += 1;
    });

    FoldOutcome::Applied { first, second }
}

pub fn add_revive(players: &mut PlayersMap, filter: &LayerFilter, revive: &Revive) -> FoldOutcome {
    let (reviver, victim) = match check(
        filter,
        revive.layer.as_deref(),
        revive.reviver.as_deref(),
        revive.victim.as_deref()
    ) {
        Ok(actors) => actors,
        Err(reason) => return FoldOutcome::Filtered(reason)
    };

    let first = apply(players, reviver, revive.server, revive.match_id, |stat| {
        stat.revives += 1;
    });

    let second = apply(players, victim, revive.server, revive.match_id, |stat| {
        stat.revived += 1;
    });

    FoldOutcome::Applied { first, second }
}
