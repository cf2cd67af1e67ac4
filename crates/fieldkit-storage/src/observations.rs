use fieldkit_core::Observation;
use tracing::debug;

use crate::{load_json, save_json, KvStore, StorageError, OBSERVATIONS_KEY};

/// The active observation collection, at most one record per point.
///
/// Mutations write the whole collection before the in-memory copy changes,
/// so a failed write leaves both sides as they were.
pub struct ObservationStore<K> {
    kv: K,
    observations: Vec<Observation>,
}

impl<K: KvStore> ObservationStore<K> {
    pub fn load(kv: K) -> Result<Self, StorageError> {
        let observations = load_json(&kv, OBSERVATIONS_KEY)?.unwrap_or_default();
        Ok(Self { kv, observations })
    }

    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.observations = load_json(&self.kv, OBSERVATIONS_KEY)?.unwrap_or_default();
        Ok(())
    }

    /// Replaces any observation for the same point and appends `observation`.
    pub fn upsert(&mut self, observation: Observation) -> Result<(), StorageError> {
        let mut next: Vec<Observation> = self
            .observations
            .iter()
            .filter(|existing| existing.point_number != observation.point_number)
            .cloned()
            .collect();
        let replaced = next.len() != self.observations.len();
        let point_number = observation.point_number;
        next.push(observation);

        save_json(&self.kv, OBSERVATIONS_KEY, &next)?;
        self.observations = next;
        debug!(event = "observation_upserted", point = point_number, replaced);
        Ok(())
    }

    /// Stored order (insertion order of the latest upserts).
    pub fn list_all(&self) -> &[Observation] {
        &self.observations
    }

    /// Display order: ascending point number.
    pub fn sorted_by_point(&self) -> Vec<Observation> {
        let mut sorted = self.observations.clone();
        sorted.sort_by_key(|obs| obs.point_number);
        sorted
    }

    pub fn find_by_point(&self, point_number: u32) -> Option<&Observation> {
        self.observations
            .iter()
            .find(|obs| obs.point_number == point_number)
    }

    pub fn has_observation(&self, point_number: u32) -> bool {
        self.find_by_point(point_number).is_some()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Removes every observation. Irreversible.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        let empty: Vec<Observation> = Vec::new();
        save_json(&self.kv, OBSERVATIONS_KEY, &empty)?;
        let removed = self.observations.len();
        self.observations = empty;
        debug!(event = "observations_cleared", removed);
        Ok(())
    }
}
