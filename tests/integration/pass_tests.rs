use crate::common::*;
use serde_json::Value;
use stats_processor::{
    config::ProcessorConfig,
    model::{event_folder::LayerFilter, stats_model::EventLog},
    processor::{run_pass, ProcessorError},
    store::{keys, publisher::PublishOptions, MemoryStore}
};

fn config(matches_minimum: u32) -> ProcessorConfig {
    ProcessorConfig {
        publish: PublishOptions {
            matches_minimum,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn published(store: &MemoryStore, steam_id: &str) -> Value {
    let json = store.hget(keys::STATS, steam_id).expect("player not published");
    serde_json::from_str(&json).expect("invalid player json")
}

fn counter(player: &Value, server_index: usize, field: &str) -> u64 {
    player["servers"][server_index][field].as_u64().unwrap()
}

#[tokio::test]
async fn test_single_death_pass() {
    init_test_env();
    let source = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        EventLog {
            deaths: vec![generate_death("1", "2", false, 1, 1)],
            ..Default::default()
        }
    );
    let store = MemoryStore::new();

    let report = run_pass(&source, &store, &config(1)).await.unwrap();

    assert_eq!(report.players, 2);
    assert_eq!(report.events, 1);
    assert_eq!(report.batches, 1);
    assert_eq!(report.retries, 0);

    let attacker = published(&store, "1");
    let victim = published(&store, "2");

    assert_eq!(counter(&attacker, 0, "kills"), 1);
    assert_eq!(counter(&attacker, 0, "deaths"), 0);
    assert_eq!(counter(&victim, 0, "deaths"), 1);
    assert_eq!(counter(&victim, 0, "kills"), 0);
    for field in ["tks", "tkd", "incaps", "falls", "revives", "revived"] {
        assert_eq!(counter(&attacker, 0, field), 0, "{}", field);
        assert_eq!(counter(&victim, 0, field), 0, "{}", field);
    }

    assert_eq!(store.hget(keys::PLAYERS, "Player 2"), Some("2".to_string()));
    assert_eq!(store.get(keys::UPDATING), None);
    assert_eq!(
        store.get(keys::LAST_UPDATE),
        Some(report.finished_at.timestamp_millis().to_string())
    );
}

#[tokio::test]
async fn test_revive_by_unknown_player_only_credits_victim() {
    init_test_env();
    let source = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        EventLog {
            revives: vec![generate_revive("76561190000000000", "2", 1, 1)],
            ..Default::default()
        }
    );
    let store = MemoryStore::new();

    run_pass(&source, &store, &config(1)).await.unwrap();

    let victim = published(&store, "2");
    assert_eq!(counter(&victim, 0, "revived"), 1);
    assert_eq!(counter(&victim, 0, "revives"), 0);
    assert_eq!(counter(&published(&store, "1"), 0, "revives"), 0);
    assert!(store.hget(keys::STATS, "76561190000000000").is_none());
}

#[tokio::test]
async fn test_leaderboards_require_match_minimum() {
    init_test_env();
    let mut events = EventLog::default();
    for match_id in 1..=10 {
        events.deaths.push(generate_death("1", "2", false, 1, match_id));
    }
    for match_id in 1..=9 {
        events.deaths.push(generate_death("3", "4", false, 1, 100 + match_id));
    }

    let source = MemorySource::new(
        generate_servers(2),
        generate_player_records(&["1", "2", "3", "4"]),
        events
    );
    let store = MemoryStore::new();

    run_pass(&source, &store, &config(10)).await.unwrap();

    let kills: Vec<String> = store
        .zrevrange("leaderboard:1:kills")
        .into_iter()
        .map(|(member, _)| member)
        .collect();
    assert_eq!(kills, vec!["1", "2"]);
    assert_eq!(store.zscore("leaderboard:1:matches", "1"), Some(10.0));
    assert_eq!(store.zscore("leaderboard:1:kdr", "1"), Some(1.0));

    // Below the minimum and on the idle server: stored, not ranked
    assert_eq!(counter(&published(&store, "3"), 0, "matchCount"), 9);
    assert!(!store.contains_key("leaderboard:2:kills"));
}

#[tokio::test]
async fn test_passes_rebuild_from_scratch() {
    init_test_env();
    let mut incap = generate_incap("1", "2", false, 1, 1);
    incap.damage = Some(87.4);

    let source = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        EventLog {
            deaths: vec![generate_death("1", "2", false, 1, 1), generate_death("2", "1", true, 1, 1)],
            incaps: vec![incap],
            revives: vec![generate_revive("1", "2", 1, 1)]
        }
    );
    let store = MemoryStore::new();

    run_pass(&source, &store, &config(1)).await.unwrap();
    let first = published(&store, "1");
    run_pass(&source, &store, &config(1)).await.unwrap();
    let second = published(&store, "1");

    assert_eq!(first, second);
    assert_eq!(counter(&second, 0, "kills"), 1);
    assert_eq!(counter(&second, 0, "tkd"), 1);
    assert_eq!(counter(&second, 0, "damage"), 87);
    assert_eq!(source.reads(), 2);
}

fn kills_over_matches(kills: i32, matches: i32) -> EventLog {
    EventLog {
        deaths: (0..kills)
            .map(|i| generate_death("1", "2", false, 1, 1 + i % matches))
            .collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_later_pass_replaces_leaderboards() {
    init_test_env();
    let store = MemoryStore::new();
    let first = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        kills_over_matches(50, 12)
    );
    run_pass(&first, &store, &config(10)).await.unwrap();
    assert_eq!(store.zscore("leaderboard:1:kills", "1"), Some(50.0));

    // Same players, far fewer events: no longer ranked on server 1
    let second = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        kills_over_matches(3, 2)
    );
    run_pass(&second, &store, &config(10)).await.unwrap();

    assert_eq!(counter(&published(&store, "1"), 0, "kills"), 3);
    assert_eq!(store.zscore("leaderboard:1:kills", "1"), None);
    assert!(!store.contains_key("leaderboard:1:kills"));
    assert!(!store.contains_key("staging:leaderboard:1:kills"));

    run_pass(&second, &store, &config(1)).await.unwrap();
    assert_eq!(store.zscore("leaderboard:1:kills", "1"), Some(3.0));
}

#[tokio::test]
async fn test_failed_pass_keeps_live_leaderboards() {
    init_test_env();
    let store = MemoryStore::new();
    let first = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        kills_over_matches(50, 12)
    );
    run_pass(&first, &store, &config(10)).await.unwrap();

    let second = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        kills_over_matches(30, 12)
    );
    let no_retries = ProcessorConfig {
        publish_retries: 0,
        ..config(10)
    };
    store.fail_next_batches(1);
    assert!(run_pass(&second, &store, &no_retries).await.is_err());

    assert_eq!(store.zscore("leaderboard:1:kills", "1"), Some(50.0));
    assert_eq!(store.get(keys::UPDATING), Some("true".to_string()));

    // The next good pass starts over from the live keys
    run_pass(&second, &store, &config(10)).await.unwrap();
    assert_eq!(store.zscore("leaderboard:1:kills", "1"), Some(30.0));
    assert_eq!(store.get(keys::UPDATING), None);
}

#[tokio::test]
async fn test_ignored_layers_are_not_counted() {
    init_test_env();
    let mut seeding = generate_death("1", "2", false, 1, 1);
    seeding.layer = Some("Sumari_Seed_v1".to_string());

    let source = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        EventLog {
            deaths: vec![seeding, generate_death("1", "2", false, 1, 2)],
            ..Default::default()
        }
    );
    let store = MemoryStore::new();
    let config = ProcessorConfig {
        layer_filter: LayerFilter::from_csv("seed,jensen"),
        ..config(1)
    };

    run_pass(&source, &store, &config).await.unwrap();

    let attacker = published(&store, "1");
    assert_eq!(counter(&attacker, 0, "kills"), 1);
    assert_eq!(counter(&attacker, 0, "matchCount"), 1);
}

#[tokio::test]
async fn test_source_failure_keeps_previous_snapshot() {
    init_test_env();
    let source = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2"]),
        EventLog {
            deaths: vec![generate_death("1", "2", false, 1, 1)],
            ..Default::default()
        }
    );
    let store = MemoryStore::new();

    run_pass(&source, &store, &config(1)).await.unwrap();
    let last_update = store.get(keys::LAST_UPDATE);
    let written = store.batches_written();

    source.set_failing(true);
    let result = run_pass(&source, &store, &config(1)).await;

    assert!(matches!(result, Err(ProcessorError::SourceError(_))));
    assert_eq!(store.batches_written(), written);
    assert_eq!(counter(&published(&store, "1"), 0, "kills"), 1);
    assert_eq!(store.get(keys::LAST_UPDATE), last_update);
    assert_eq!(store.get(keys::UPDATING), None);
}

#[tokio::test]
async fn test_failed_batches_are_retried() {
    init_test_env();
    let source = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2", "3"]),
        EventLog::default()
    );
    let store = MemoryStore::new();
    let config = ProcessorConfig {
        publish: PublishOptions {
            batch_size: 1,
            ..Default::default()
        },
        publish_retries: 2,
        ..Default::default()
    };

    store.fail_next_batches(2);
    let report = run_pass(&source, &store, &config).await.unwrap();

    assert_eq!(report.batches, 3);
    assert_eq!(report.retries, 1);
    assert_eq!(store.hlen(keys::STATS), 3);
    assert_eq!(store.get(keys::UPDATING), None);
    assert!(store.get(keys::LAST_UPDATE).is_some());
}

#[tokio::test]
async fn test_exhausted_retries_leave_updating_flag() {
    init_test_env();
    let source = MemorySource::new(
        generate_servers(1),
        generate_player_records(&["1", "2", "3"]),
        EventLog::default()
    );
    let store = MemoryStore::new();
    let config = ProcessorConfig {
        publish: PublishOptions {
            batch_size: 2,
            ..Default::default()
        },
        publish_retries: 1,
        ..Default::default()
    };

    store.fail_next_batches(usize::MAX);
    let result = run_pass(&source, &store, &config).await;

    match result {
        Err(ProcessorError::PublishError { failed, attempts, .. }) => {
            assert_eq!(failed, vec![0, 1]);
            assert_eq!(attempts, 2);
        }
        other => panic!("expected publish error, got {:?}", other)
    }

    assert_eq!(store.get(keys::UPDATING), Some("true".to_string()));
    assert_eq!(store.get(keys::LAST_UPDATE), None);
}
