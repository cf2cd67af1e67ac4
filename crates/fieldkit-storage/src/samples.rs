use std::collections::BTreeMap;
use tracing::debug;

use crate::{load_json, save_json, KvStore, StorageError, SAMPLES_TAKEN_KEY};

/// "Physical sample collected" flags, independent of observations.
pub struct SampleTracker<K> {
    kv: K,
    taken: BTreeMap<u32, bool>,
}

impl<K: KvStore> SampleTracker<K> {
    pub fn load(kv: K) -> Result<Self, StorageError> {
        let taken = load_json(&kv, SAMPLES_TAKEN_KEY)?.unwrap_or_default();
        Ok(Self { kv, taken })
    }

    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.taken = load_json(&self.kv, SAMPLES_TAKEN_KEY)?.unwrap_or_default();
        Ok(())
    }

    pub fn mark_taken(&mut self, point_number: u32) -> Result<(), StorageError> {
        if self.is_taken(point_number) {
            return Ok(());
        }
        let mut next = self.taken.clone();
        next.insert(point_number, true);
        save_json(&self.kv, SAMPLES_TAKEN_KEY, &next)?;
        self.taken = next;
        debug!(event = "sample_marked", point = point_number);
        Ok(())
    }

    pub fn is_taken(&self, point_number: u32) -> bool {
        self.taken.get(&point_number).copied().unwrap_or(false)
    }

    pub fn taken_points(&self) -> Vec<u32> {
        self.taken
            .iter()
            .filter(|(_, taken)| **taken)
            .map(|(number, _)| *number)
            .collect()
    }

    pub fn flags(&self) -> &BTreeMap<u32, bool> {
        &self.taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FlakyKv;
    use crate::MemoryKv;
    use std::sync::Arc;

    #[test]
    fn mark_and_query() {
        let mut tracker = SampleTracker::load(MemoryKv::new()).expect("load");
        tracker.mark_taken(5).expect("mark");
        assert!(tracker.is_taken(5));
        assert!(!tracker.is_taken(6));
        assert_eq!(tracker.taken_points(), vec![5]);
    }

    #[test]
    fn flags_round_trip_and_use_object_encoding() {
        let kv = MemoryKv::new();
        let mut tracker = SampleTracker::load(kv.clone()).expect("load");
        tracker.mark_taken(10).expect("mark");
        tracker.mark_taken(2).expect("mark");

        assert_eq!(
            kv.get(SAMPLES_TAKEN_KEY).expect("get").as_deref(),
            Some("{\"2\":true,\"10\":true}")
        );
        let reloaded = SampleTracker::load(kv).expect("reload");
        assert_eq!(reloaded.flags(), tracker.flags());
    }

    #[test]
    fn explicit_false_reads_as_not_taken() {
        let kv = MemoryKv::new();
        kv.set(SAMPLES_TAKEN_KEY, "{\"3\":false,\"4\":true}")
            .expect("seed");
        let tracker = SampleTracker::load(kv).expect("load");
        assert!(!tracker.is_taken(3));
        assert_eq!(tracker.taken_points(), vec![4]);
    }

    #[test]
    fn failed_write_keeps_flag_unset() {
        let kv = Arc::new(FlakyKv::default());
        let mut tracker = SampleTracker::load(kv.clone()).expect("load");
        kv.fail(true);
        assert!(tracker.mark_taken(1).is_err());
        assert!(!tracker.is_taken(1));
    }
}
