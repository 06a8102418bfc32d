use crate::{database::db_structs::PlayerRating, model::structures::rating_attribute::RatingAttribute};
use indexmap::IndexMap;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex}
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// (player id, encoded rating attribute id)
pub type RatingKey = (i64, i32);

/// In-memory store of per-(player, attribute) ratings.
///
/// Read-modify-write cycles for a key must run under that key's async mutex:
/// callers take guards for every key they touch via `lock_keys`, which
/// acquires in sorted order so overlapping buckets cannot deadlock. Disjoint
/// key sets proceed without contention.
pub struct RatingTracker {
    ratings: Mutex<IndexMap<RatingKey, PlayerRating>>,
    key_locks: Mutex<HashMap<RatingKey, Arc<AsyncMutex<()>>>>
}

impl Default for RatingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingTracker {
    pub fn new() -> RatingTracker {
        RatingTracker {
            ratings: Mutex::new(IndexMap::new()),
            key_locks: Mutex::new(HashMap::new())
        }
    }

    /// Loads previously persisted ratings, replacing any existing entries.
    pub fn seed(&self, ratings: Vec<PlayerRating>) {
        let mut map = self.ratings.lock().expect("ratings lock poisoned");
        for rating in ratings {
            map.insert((rating.player_id, rating.attribute.encode()), rating);
        }
    }

    /// Acquires the per-key guards for a bucket update. Keys are deduplicated
    /// and locked in sorted order.
    pub async fn lock_keys(&self, keys: &[RatingKey]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            let lock = {
                let mut locks = self.key_locks.lock().expect("key lock map poisoned");
                locks
                    .entry(key)
                    .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                    .clone()
            };
            guards.push(lock.lock_owned().await);
        }

        guards
    }

    /// Returns the rating for the pair, creating it from the default prior on
    /// first reference.
    pub fn get_or_create(&self, player_id: i64, attribute: RatingAttribute) -> PlayerRating {
        let mut map = self.ratings.lock().expect("ratings lock poisoned");
        map.entry((player_id, attribute.encode()))
            .or_insert_with(|| PlayerRating::prior(player_id, attribute))
            .clone()
    }

    pub fn get(&self, player_id: i64, attribute: RatingAttribute) -> Option<PlayerRating> {
        let map = self.ratings.lock().expect("ratings lock poisoned");
        map.get(&(player_id, attribute.encode())).cloned()
    }

    pub fn set(&self, rating: PlayerRating) {
        let mut map = self.ratings.lock().expect("ratings lock poisoned");
        map.insert((rating.player_id, rating.attribute.encode()), rating);
    }

    pub fn all(&self) -> Vec<PlayerRating> {
        let map = self.ratings.lock().expect("ratings lock poisoned");
        map.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ratings.lock().expect("ratings lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
