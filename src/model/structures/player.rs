use crate::{
    database::db_structs::{PlayerRecord, Server},
    model::{derived, rating::rating, structures::rating_scheme::RatingScheme}
};
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

/// Per (player, server) counters for one pass.
///
/// Counters only ever grow while events are folded. The derived fields
/// are written once by [`PlayerServerStat::finalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerServerStat {
    pub id: i32,
    pub name: String,
    pub kills: u32,
    pub tks: u32,
    pub deaths: u32,
    pub tkd: u32,
    pub incaps: u32,
    pub falls: u32,
    pub revives: u32,
    pub revived: u32,
    pub damage: u64,
    pub kdr: f64,
    pub idr: f64,
    pub ke: f64,
    pub de: f64,
    pub rating: f64,
    pub match_count: u32,
    /// Distinct matches seen while folding. Emptied by `finalize`.
    #[serde(skip)]
    pub matches: HashSet<i32>
}

impl PlayerServerStat {
    pub fn stub(server: &Server) -> PlayerServerStat {
        PlayerServerStat {
            id: server.id,
            name: server.name.clone(),
            ..Default::default()
        }
    }

    pub fn record_match(&mut self, match_id: i32) {
        self.matches.insert(match_id);
    }

    /// Deaths not caused by a teammate
    pub fn real_deaths(&self) -> u32 {
        self.deaths.saturating_sub(self.tkd)
    }

    /// Computes every derived metric from the folded counters and drops the
    /// match set. Calling it twice yields the same values.
    pub fn finalize(&mut self, scheme: &RatingScheme) {
        self.kdr = derived::death_ratio(self.kills, self.real_deaths());
        self.idr = derived::death_ratio(self.incaps, self.real_deaths());
        self.ke = derived::efficiency(self.kills, self.incaps);
        self.de = derived::efficiency(self.real_deaths(), self.falls);
        self.rating = rating(self, scheme);

        if !self.matches.is_empty() {
            self.match_count = self.matches.len() as u32;
            self.matches = HashSet::new();
        }
    }

    /// Adds the counters of `other` into `self`. Derived fields are left
    /// untouched and must be recomputed.
    fn accumulate(&mut self, other: &PlayerServerStat) {
        self.kills += other.kills;
        self.tks += other.tks;
        self.deaths += other.deaths;
        self.tkd += other.tkd;
        self.incaps += other.incaps;
        self.falls += other.falls;
        self.revives += other.revives;
        self.revived += other.revived;
        self.damage += other.damage;
        self.match_count += other.match_count;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub steam_id: String,
    pub name: String,
    #[serde(serialize_with = "servers_by_id")]
    pub servers: HashMap<i32, PlayerServerStat>
}

impl Player {
    /// A player with one zeroed stat per server
    pub fn stub(record: &PlayerRecord, servers: &[Server]) -> Player {
        Player {
            steam_id: record.steam_id.clone(),
            name: record.name.clone(),
            servers: servers
                .iter()
                .map(|server| (server.id, PlayerServerStat::stub(server)))
                .collect()
        }
    }

    pub fn server_mut(&mut self, server_id: i32) -> Option<&mut PlayerServerStat> {
        self.servers.get_mut(&server_id)
    }

    pub fn server(&self, server_id: i32) -> Option<&PlayerServerStat> {
        self.servers.get(&server_id)
    }

    pub fn finalize(&mut self, scheme: &RatingScheme) {
        for stat in self.servers.values_mut() {
            stat.finalize(scheme);
        }
    }

    /// Sums every server into one stat and derives its metrics.
    /// Only meaningful after `finalize`, since it sums `match_count`;
    /// match ids are unique across servers so the sum is still distinct.
    pub fn totals(&self, scheme: &RatingScheme) -> PlayerServerStat {
        let mut totals = PlayerServerStat {
            id: 0,
            name: "all".to_string(),
            ..Default::default()
        };

        for stat in self.servers.values() {
            totals.accumulate(stat);
        }

        totals.finalize(scheme);
        totals
    }
}

fn servers_by_id<S>(servers: &HashMap<i32, PlayerServerStat>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer
{
    let mut sorted: Vec<&PlayerServerStat> = servers.values().collect();
    sorted.sort_by_key(|stat| stat.id);

    serializer.collect_seq(sorted)
}
