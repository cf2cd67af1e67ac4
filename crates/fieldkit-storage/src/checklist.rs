use fieldkit_core::{checklist_items, ChecklistItem};
use std::collections::BTreeMap;

use crate::{load_json, save_json, KvStore, StorageError, CHECKLIST_KEY};

/// Checked state of the equipment checklist, keyed by item index.
pub struct ChecklistStore<K> {
    kv: K,
    checked: BTreeMap<usize, bool>,
}

impl<K: KvStore> ChecklistStore<K> {
    pub fn load(kv: K) -> Result<Self, StorageError> {
        let checked = load_json(&kv, CHECKLIST_KEY)?.unwrap_or_default();
        Ok(Self { kv, checked })
    }

    pub fn set(&mut self, index: usize, checked: bool) -> Result<(), StorageError> {
        let mut next = self.checked.clone();
        next.insert(index, checked);
        save_json(&self.kv, CHECKLIST_KEY, &next)?;
        self.checked = next;
        Ok(())
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(&index).copied().unwrap_or(false)
    }

    pub fn items(&self) -> Vec<ChecklistItem> {
        checklist_items(|index| self.is_checked(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryKv;
    use fieldkit_core::EQUIPMENT_CHECKLIST;

    #[test]
    fn checked_items_persist() {
        let kv = MemoryKv::new();
        let mut store = ChecklistStore::load(kv.clone()).expect("load");
        store.set(0, true).expect("check");
        store.set(3, true).expect("check");
        store.set(3, false).expect("uncheck");

        let reloaded = ChecklistStore::load(kv).expect("reload");
        let items = reloaded.items();
        assert_eq!(items.len(), EQUIPMENT_CHECKLIST.len());
        assert!(items[0].checked);
        assert!(!items[3].checked);
        assert_eq!(items[1].label, "Sample bags (10+)");
    }
}
