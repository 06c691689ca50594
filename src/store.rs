use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::fingerprint::FingerprintSequence;

/// One persisted fingerprint. Field order is the sort order, so records
/// sharing a hash are adjacent.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub hash: u32,
    pub track_id: String,
    pub offset_ms: u32,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    records: Vec<FingerprintRecord>,
}

/// Set of `(hash, track_id, offset_ms)` records with lookup by hash.
#[derive(Debug, Default)]
pub struct FingerprintStore {
    records: BTreeSet<FingerprintRecord>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a store file. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No store at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store: {}", path.display()))?;
        let file: StoreFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store: {}", path.display()))?;

        let store = Self {
            records: file.records.into_iter().collect(),
        };
        log::info!(
            "Loaded {} records for {} track(s) from {}",
            store.len(),
            store.tracks().len(),
            path.display()
        );
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = StoreFile {
            records: self.records.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file).context("Failed to serialize store")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write store: {}", path.display()))?;
        Ok(())
    }

    /// Insert if absent. Returns `true` when the record was new.
    pub fn insert(&mut self, record: FingerprintRecord) -> bool {
        self.records.insert(record)
    }

    /// Insert every fingerprint of a sequence; returns how many were new.
    pub fn insert_sequence(&mut self, sequence: &FingerprintSequence) -> usize {
        sequence
            .fingerprints
            .iter()
            .filter(|fp| {
                self.insert(FingerprintRecord {
                    hash: fp.hash,
                    track_id: sequence.track_id.clone(),
                    offset_ms: fp.offset_ms,
                })
            })
            .count()
    }

    /// All `(track_id, offset_ms)` pairs stored under `hash`.
    pub fn lookup(&self, hash: u32) -> impl Iterator<Item = (&str, u32)> + '_ {
        let start = FingerprintRecord {
            hash,
            track_id: String::new(),
            offset_ms: 0,
        };
        self.records
            .range(start..)
            .take_while(move |r| r.hash == hash)
            .map(|r| (r.track_id.as_str(), r.offset_ms))
    }

    /// Remove all records of a track; returns how many were removed.
    pub fn remove_track(&mut self, track_id: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.track_id != track_id);
        before - self.records.len()
    }

    pub fn tracks(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut tracks: Vec<&str> = self
            .records
            .iter()
            .map(|r| r.track_id.as_str())
            .filter(|t| seen.insert(*t))
            .collect();
        tracks.sort_unstable();
        tracks
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::pipeline::SubFingerprint;

    fn record(hash: u32, track: &str, offset_ms: u32) -> FingerprintRecord {
        FingerprintRecord {
            hash,
            track_id: track.to_string(),
            offset_ms,
        }
    }

    fn sequence(track: &str, hashes: &[u32]) -> FingerprintSequence {
        FingerprintSequence {
            track_id: track.to_string(),
            fingerprints: hashes
                .iter()
                .enumerate()
                .map(|(i, &hash)| SubFingerprint {
                    hash,
                    block_index: 0,
                    frame_index: i + 1,
                    offset_ms: 10 * (i as u32 + 1),
                })
                .collect(),
        }
    }

    #[test]
    fn insert_is_idempotent() {
        let mut store = FingerprintStore::new();
        assert!(store.insert(record(7, "a", 10)));
        assert!(!store.insert(record(7, "a", 10)));
        assert!(store.insert(record(7, "a", 20)));
        assert!(store.insert(record(7, "b", 10)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn insert_sequence_counts_new_records() {
        let mut store = FingerprintStore::new();
        let seq = sequence("song", &[1, 2, 3]);
        assert_eq!(store.insert_sequence(&seq), 3);
        assert_eq!(store.insert_sequence(&seq), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn lookup_by_hash_spans_tracks() {
        let mut store = FingerprintStore::new();
        store.insert_sequence(&sequence("b", &[5, 9, 5]));
        store.insert_sequence(&sequence("a", &[9, 5]));
        store.insert(record(u32::MAX, "c", 0));

        let hits: Vec<_> = store.lookup(5).collect();
        assert_eq!(hits, vec![("a", 20), ("b", 10), ("b", 30)]);
        assert_eq!(store.lookup(4).count(), 0);
        assert_eq!(store.lookup(u32::MAX).collect::<Vec<_>>(), vec![("c", 0)]);
    }

    #[test]
    fn remove_track_and_list_tracks() {
        let mut store = FingerprintStore::new();
        store.insert_sequence(&sequence("b", &[1, 2]));
        store.insert_sequence(&sequence("a", &[1]));
        assert_eq!(store.tracks(), vec!["a", "b"]);

        assert_eq!(store.remove_track("b"), 2);
        assert_eq!(store.tracks(), vec!["a"]);
        assert_eq!(store.remove_track("missing"), 0);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let missing = FingerprintStore::load(&path).unwrap();
        assert!(missing.is_empty());

        let mut store = FingerprintStore::new();
        store.insert_sequence(&sequence("song", &[3, 1, 4, 1, 5]));
        store.save(&path).unwrap();

        let loaded = FingerprintStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.lookup(1).count(), 2);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FingerprintStore::load(&path).is_err());
    }
}
