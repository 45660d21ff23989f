//! Selected row identifiers, mirrored to session storage.

use std::collections::BTreeSet;

use crate::DEBOUNCE_MS;
use crate::debounce::Debouncer;

/// Session storage key holding the JSON array of selected row ids.
pub const STORAGE_KEY: &str = "checkedSheetItems";

/// Minimal key/value view of the browser's `sessionStorage`.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str);
    fn remove_item(&mut self, key: &str);
}

/// Set of selected row ids with debounced persistence.
///
/// Mutations only schedule a write; [`SelectionStore::flush_if_due`] performs
/// it once the save timer has been quiet for the debounce delay, so a burst
/// of changes produces a single write of the final state.
#[derive(Debug)]
pub struct SelectionStore<S> {
    ids: BTreeSet<String>,
    storage: S,
    save: Debouncer,
    dirty: bool,
    load_warning: Option<String>,
}

impl<S: SessionStorage> SelectionStore<S> {
    /// Restore the selection from storage.
    ///
    /// Stored data that is not a JSON array of strings is discarded and the
    /// key removed; the store then starts empty.
    pub fn load(mut storage: S) -> Self {
        let mut ids = BTreeSet::new();
        let mut load_warning = None;

        if let Some(raw) = storage.get_item(STORAGE_KEY) {
            match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(stored) => ids.extend(stored),
                Err(err) => {
                    load_warning = Some(format!("discarded stored selection: {err}"));
                    storage.remove_item(STORAGE_KEY);
                }
            }
        }

        Self { ids, storage, save: Debouncer::new(DEBOUNCE_MS), dirty: false, load_warning }
    }

    /// Why the stored selection was discarded, if it was.
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    pub fn add(&mut self, id: &str, now: u64) -> bool {
        let added = self.ids.insert(id.to_string());
        if added {
            self.touch(now);
        }
        added
    }

    pub fn remove(&mut self, id: &str, now: u64) -> bool {
        let removed = self.ids.remove(id);
        if removed {
            self.touch(now);
        }
        removed
    }

    /// Always persists, even when already empty.
    pub fn clear(&mut self, now: u64) {
        self.ids.clear();
        self.touch(now);
    }

    pub fn has(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn all(&self) -> &BTreeSet<String> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Deadline of the pending write, if any.
    pub fn save_deadline(&self) -> Option<u64> {
        self.save.deadline()
    }

    /// Write to storage if the save timer has elapsed. Returns true on write.
    pub fn flush_if_due(&mut self, now: u64) -> bool {
        if self.save.fire_if_due(now) {
            self.write();
            true
        } else {
            false
        }
    }

    /// Write any pending change immediately (page teardown).
    pub fn flush_now(&mut self) -> bool {
        self.save.cancel();
        if self.dirty {
            self.write();
            true
        } else {
            false
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn touch(&mut self, now: u64) {
        self.dirty = true;
        self.save.schedule(now);
    }

    fn write(&mut self) {
        let ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        if let Ok(json) = serde_json::to_string(&ids) {
            self.storage.set_item(STORAGE_KEY, &json);
        }
        self.dirty = false;
    }
}
