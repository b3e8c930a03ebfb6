use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::posting::{Posting, ScoredPosting};

const RAW_FILE_PREFIX: &str = "job_postings_";
const SCORED_FILE_PREFIX: &str = "job_postings_scored_";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("scored id {0} has no raw posting")]
    OrphanScore(String),
}

/// Durable result set for one run: a raw posting map and a scored map,
/// each rewritten whole to its JSON document after every recorded item so
/// a crash loses at most the item in flight.
///
/// Invariant: the scored map's keys are always a subset of the raw map's.
pub struct CheckpointStore {
    raw_path: PathBuf,
    scored_path: PathBuf,
    raw: BTreeMap<String, Posting>,
    scored: BTreeMap<String, ScoredPosting>,
}

impl CheckpointStore {
    /// Start an empty store for a new run. Files are created lazily on the
    /// first recorded item.
    pub fn create(data_dir: &Path, run_timestamp: &str) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir)?;

        Ok(CheckpointStore {
            raw_path: data_dir.join(format!("{}{}.json", RAW_FILE_PREFIX, run_timestamp)),
            scored_path: data_dir.join(format!("{}{}.json", SCORED_FILE_PREFIX, run_timestamp)),
            raw: BTreeMap::new(),
            scored: BTreeMap::new(),
        })
    }

    /// Reopen the most recent run in `data_dir`, if any. The timestamped
    /// file names sort lexicographically, so the max raw file is the
    /// latest run.
    pub fn open_latest(data_dir: &Path) -> Result<Option<Self>, StoreError> {
        let mut raw_files: Vec<PathBuf> = vec![];
        let entries = match fs::read_dir(data_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(None),
        };

        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(RAW_FILE_PREFIX)
                && !name.starts_with(SCORED_FILE_PREFIX)
                && name.ends_with(".json")
            {
                raw_files.push(path);
            }
        }

        let Some(raw_path) = raw_files.into_iter().max() else {
            return Ok(None);
        };

        let raw_name = raw_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let run_timestamp = raw_name
            .trim_start_matches(RAW_FILE_PREFIX)
            .trim_end_matches(".json");
        let scored_path = data_dir.join(format!("{}{}.json", SCORED_FILE_PREFIX, run_timestamp));

        let raw: BTreeMap<String, Posting> = serde_json::from_str(&fs::read_to_string(&raw_path)?)?;
        let scored: BTreeMap<String, ScoredPosting> = match fs::read_to_string(&scored_path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(_) => BTreeMap::new(),
        };

        Ok(Some(CheckpointStore {
            raw_path,
            scored_path,
            raw,
            scored,
        }))
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn scored_path(&self) -> &Path {
        &self.scored_path
    }

    pub fn contains_raw(&self, id: &str) -> bool {
        self.raw.contains_key(id)
    }

    pub fn raw(&self) -> &BTreeMap<String, Posting> {
        &self.raw
    }

    pub fn scored(&self) -> &BTreeMap<String, ScoredPosting> {
        &self.scored
    }

    /// Raw ids with no scored entry yet, in key order.
    pub fn unscored_ids(&self) -> Vec<String> {
        self.raw
            .keys()
            .filter(|id| !self.scored.contains_key(*id))
            .cloned()
            .collect()
    }

    /// Insert or overwrite a posting and flush the raw document.
    pub fn record_posting(&mut self, id: &str, posting: Posting) -> Result<(), StoreError> {
        self.raw.insert(id.to_string(), posting);
        self.flush_raw()
    }

    /// Insert or overwrite a scored posting and flush the scored document.
    /// Rejects ids absent from the raw store to uphold the subset invariant.
    pub fn record_scored(&mut self, id: &str, scored: ScoredPosting) -> Result<(), StoreError> {
        if !self.raw.contains_key(id) {
            return Err(StoreError::OrphanScore(id.to_string()));
        }
        self.scored.insert(id.to_string(), scored);
        self.flush_scored()
    }

    fn flush_raw(&self) -> Result<(), StoreError> {
        write_replacing(&self.raw_path, &serde_json::to_string_pretty(&self.raw)?)
    }

    fn flush_scored(&self) -> Result<(), StoreError> {
        write_replacing(&self.scored_path, &serde_json::to_string_pretty(&self.scored)?)
    }
}

/// Write via a sibling temp file and rename so a kill mid-write can never
/// truncate the current document.
fn write_replacing(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CheckpointStore, StoreError};
    use crate::domain::posting::{Posting, ScoredPosting};

    fn posting(n: usize) -> Posting {
        Posting::new(
            format!("Company {}", n),
            format!("https://example.com/company/{}", n),
            format!("Role {}", n),
            format!("https://example.com/jobs/{}", n),
            format!("Description for role {}", n),
        )
    }

    #[test]
    fn every_record_is_recoverable_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::create(dir.path(), "20260829_120000").unwrap();

        for n in 0..5 {
            let p = posting(n);
            let id = p.identity();
            store.record_posting(&id, p.clone()).unwrap();
            if n < 3 {
                store
                    .record_scored(&id, ScoredPosting::new(p, 7))
                    .unwrap();
            }
        }

        // Simulate a restart: reload whatever reached disk.
        let reopened = CheckpointStore::open_latest(dir.path()).unwrap().unwrap();
        assert_eq!(reopened.raw().len(), 5);
        assert_eq!(reopened.scored().len(), 3);
        assert!(reopened
            .scored()
            .keys()
            .all(|id| reopened.raw().contains_key(id)));
        assert_eq!(reopened.unscored_ids().len(), 2);
    }

    #[test]
    fn scored_entry_without_raw_posting_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::create(dir.path(), "20260829_120000").unwrap();

        let result = store.record_scored("deadbeef", ScoredPosting::new(posting(0), 5));
        assert!(matches!(result, Err(StoreError::OrphanScore(_))));
        assert!(store.scored().is_empty());
    }

    #[test]
    fn rescoring_an_id_overwrites_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::create(dir.path(), "20260829_120000").unwrap();

        let p = posting(1);
        let id = p.identity();
        store.record_posting(&id, p.clone()).unwrap();
        store.record_scored(&id, ScoredPosting::new(p.clone(), 3)).unwrap();
        store.record_scored(&id, ScoredPosting::new(p, 9)).unwrap();

        assert_eq!(store.scored().len(), 1);
        assert_eq!(store.scored()[&id].match_score, 9);
    }

    #[test]
    fn open_latest_picks_the_newest_run() {
        let dir = tempfile::tempdir().unwrap();

        let mut old = CheckpointStore::create(dir.path(), "20260828_090000").unwrap();
        let p = posting(1);
        old.record_posting(&p.identity(), p).unwrap();

        let mut newer = CheckpointStore::create(dir.path(), "20260829_090000").unwrap();
        for n in 0..2 {
            let p = posting(n);
            newer.record_posting(&p.identity(), p).unwrap();
        }

        let latest = CheckpointStore::open_latest(dir.path()).unwrap().unwrap();
        assert_eq!(latest.raw().len(), 2);
        assert!(latest
            .raw_path()
            .to_string_lossy()
            .contains("20260829_090000"));
    }

    #[test]
    fn flushes_replace_documents_without_leaving_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::create(dir.path(), "20260829_120000").unwrap();

        for n in 0..3 {
            let p = posting(n);
            let id = p.identity();
            store.record_posting(&id, p.clone()).unwrap();
            store.record_scored(&id, ScoredPosting::new(p, 6)).unwrap();
        }

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.ends_with(".json")));

        let reopened = CheckpointStore::open_latest(dir.path()).unwrap().unwrap();
        assert_eq!(reopened.raw().len(), 3);
        assert_eq!(reopened.scored().len(), 3);
    }

    #[test]
    fn open_latest_on_empty_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointStore::open_latest(dir.path()).unwrap().is_none());
    }
}
