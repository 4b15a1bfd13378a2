use super::{SnapshotStore, StoreError, StoreOp};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard}
};

#[derive(Debug, Default)]
struct State {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    sorted_sets: HashMap<String, HashMap<String, f64>>,
    failures_left: usize,
    batches_written: usize
}

impl State {
    fn contains_key(&self, key: &str) -> bool {
        self.strings.contains_key(key) || self.hashes.contains_key(key) || self.sorted_sets.contains_key(key)
    }

    fn remove(&mut self, key: &str) {
        self.strings.remove(key);
        self.hashes.remove(key);
        self.sorted_sets.remove(key);
    }
}

/// In-process store used for dry runs and tests.
///
/// [`MemoryStore::fail_next_batches`] makes the next `n` calls to
/// `write_batch` fail without applying anything.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fail_next_batches(&self, n: usize) {
        self.state().failures_left = n;
    }

    /// Number of batches applied successfully
    pub fn batches_written(&self) -> usize {
        self.state().batches_written
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.state().strings.get(key).cloned()
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<String> {
        self.state().hashes.get(key).and_then(|h| h.get(field)).cloned()
    }

    pub fn hlen(&self, key: &str) -> usize {
        self.state().hashes.get(key).map_or(0, HashMap::len)
    }

    pub fn zscore(&self, key: &str, member: &str) -> Option<f64> {
        self.state().sorted_sets.get(key).and_then(|z| z.get(member)).copied()
    }

    /// Members of a sorted set, highest score first. Ties are ordered by
    /// member descending, as `ZREVRANGE` does.
    pub fn zrevrange(&self, key: &str) -> Vec<(String, f64)> {
        let mut members: Vec<(String, f64)> = self
            .state()
            .sorted_sets
            .get(key)
            .map(|z| z.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();

        members.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        members
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state().contains_key(key)
    }
}

impl SnapshotStore for MemoryStore {
    async fn write_batch(&self, ops: &[StoreOp]) -> Result<(), StoreError> {
        let mut state = self.state();

        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(StoreError::Unavailable("injected batch failure".to_string()));
        }

        for op in ops {
            match op {
                StoreOp::HashSet { key, field, value } => {
                    state
                        .hashes
                        .entry(key.clone())
                        .or_default()
                        .insert(field.clone(), value.clone());
                }
                StoreOp::SortedSetAdd { key, member, score } => {
                    state
                        .sorted_sets
                        .entry(key.clone())
                        .or_default()
                        .insert(member.clone(), *score);
                }
            }
        }

        state.batches_written += 1;

        Ok(())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state().strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.state().remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let state = self.state();
        let matches = |key: &String| match pattern.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix),
            None => key == pattern
        };

        let mut keys: Vec<String> = state
            .strings
            .keys()
            .chain(state.hashes.keys())
            .chain(state.sorted_sets.keys())
            .filter(|key| matches(key))
            .cloned()
            .collect();
        keys.sort_unstable();
        keys.dedup();

        Ok(keys)
    }

    async fn swap(&self, renames: &[(String, String)], stale: &[String]) -> Result<(), StoreError> {
        let mut state = self.state();

        if let Some((from, _)) = renames.iter().find(|(from, _)| !state.contains_key(from)) {
            return Err(StoreError::Unavailable(format!("no such key '{}'", from)));
        }

        for (from, to) in renames {
            state.remove(to);

            if let Some(value) = state.strings.remove(from) {
                state.strings.insert(to.clone(), value);
            }
            if let Some(value) = state.hashes.remove(from) {
                state.hashes.insert(to.clone(), value);
            }
            if let Some(value) = state.sorted_sets.remove(from) {
                state.sorted_sets.insert(to.clone(), value);
            }
        }

        for key in stale {
            state.remove(key);
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let mut state = self.state();
        state.strings.clear();
        state.hashes.clear();
        state.sorted_sets.clear();

        Ok(())
    }
}
