use crate::{
    database::db_structs::{Death, Incap, PlayerRecord, Revive, Server},
    model::{
        event_folder::PlayersMap,
        stats_model::EventLog,
        structures::player::Player
    }
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const TEST_LAYER: &str = "Narva_RAAS_v1";

/// Servers with ids `1..=n`
pub fn generate_servers(n: i32) -> Vec<Server> {
    (1..=n)
        .map(|id| Server {
            id,
            name: format!("Server {}", id)
        })
        .collect()
}

pub fn generate_player_record(steam_id: &str) -> PlayerRecord {
    PlayerRecord {
        steam_id: steam_id.to_string(),
        name: format!("Player {}", steam_id)
    }
}

pub fn generate_player_records(steam_ids: &[&str]) -> Vec<PlayerRecord> {
    steam_ids.iter().map(|id| generate_player_record(id)).collect()
}

pub fn generate_players_map(steam_ids: &[&str], servers: &[Server]) -> PlayersMap {
    steam_ids
        .iter()
        .map(|id| (id.to_string(), Player::stub(&generate_player_record(id), servers)))
        .collect()
}

pub fn generate_death(attacker: &str, victim: &str, teamkill: bool, server: i32, match_id: i32) -> Death {
    Death {
        attacker: Some(attacker.to_string()),
        victim: Some(victim.to_string()),
        teamkill,
        server,
        match_id,
        layer: Some(TEST_LAYER.to_string())
    }
}

/// An incap without a damage reading; set `damage` on the result when needed.
pub fn generate_incap(attacker: &str, victim: &str, teamkill: bool, server: i32, match_id: i32) -> Incap {
    Incap {
        attacker: Some(attacker.to_string()),
        victim: Some(victim.to_string()),
        teamkill,
        server,
        match_id,
        layer: Some(TEST_LAYER.to_string()),
        damage: None
    }
}

pub fn generate_revive(reviver: &str, victim: &str, server: i32, match_id: i32) -> Revive {
    Revive {
        reviver: Some(reviver.to_string()),
        victim: Some(victim.to_string()),
        server,
        match_id,
        layer: Some(TEST_LAYER.to_string())
    }
}

/// `n` events of each kind between random pairs of `steam_ids`, spread over
/// `servers` and `n_matches` matches. Seeded, so identical across runs.
pub fn generate_event_log(steam_ids: &[&str], servers: &[Server], n: usize, n_matches: i32) -> EventLog {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut log = EventLog::default();

    for _ in 0..n {
        let a = steam_ids[rng.random_range(0..steam_ids.len())];
        let b = steam_ids[rng.random_range(0..steam_ids.len())];
        let server = servers[rng.random_range(0..servers.len())].id;
        let match_id = rng.random_range(1..=n_matches);
        let teamkill = rng.random_bool(0.05);

        log.deaths.push(generate_death(a, b, teamkill, server, match_id));

        let mut incap = generate_incap(b, a, teamkill, server, match_id);
        incap.damage = Some(rng.random_range(10.0..150.0));
        log.incaps.push(incap);

        log.revives.push(generate_revive(a, b, server, match_id));
    }

    log
}
