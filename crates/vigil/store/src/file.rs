//! File-backed candidate store.
//!
//! Canonical state is one JSON document per candidate under
//! `<root>/candidates/`. Two derived views are rebuilt on demand from the
//! canonical records: `<root>/snapshot.json` (machine-readable full dump)
//! and `<root>/candidates.txt` (human-readable listing).

use crate::traits::CandidateStore;
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};
use vigil_types::{Candidate, CandidateId, NewCandidate};

/// Durable candidate store rooted at a directory.
pub struct FileCandidateStore {
    root: PathBuf,
    cache: RwLock<HashMap<CandidateId, Candidate>>,
}

impl FileCandidateStore {
    /// Open the store, creating the directory layout if needed and loading
    /// every existing record. A failure here is fatal to the caller by
    /// design: resuming without the durable records would re-emit
    /// notifications and re-run resolved gates.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("candidates"))?;

        let mut cache = HashMap::new();
        for entry in fs::read_dir(root.join("candidates"))? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let raw = fs::read_to_string(&path)?;
                let candidate: Candidate = serde_json::from_str(&raw)?;
                cache.insert(candidate.id.clone(), candidate);
            }
        }
        info!(root = %root.display(), records = cache.len(), "opened candidate store");

        Ok(Self {
            root,
            cache: RwLock::new(cache),
        })
    }

    /// Record file for one id. Ids come from an external source and are
    /// used as file names, so anything that could escape the candidates
    /// directory is refused.
    fn record_path(&self, id: &CandidateId) -> StoreResult<PathBuf> {
        let raw = id.as_str();
        if raw.is_empty() || raw == "." || raw == ".." || raw.contains(['/', '\\']) {
            return Err(StoreError::InvalidId(raw.to_string()));
        }
        Ok(self.root.join("candidates").join(format!("{raw}.json")))
    }

    fn write_atomic(path: &Path, contents: &str) -> StoreResult<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Full machine-readable dump of every record, sorted by id.
    pub fn write_snapshot(&self) -> StoreResult<()> {
        let guard = self
            .cache
            .read()
            .map_err(|_| StoreError::Backend("cache lock poisoned".to_string()))?;
        let sorted: BTreeMap<&CandidateId, &Candidate> = guard.iter().collect();
        let json = serde_json::to_string_pretty(&sorted)?;
        Self::write_atomic(&self.root.join("snapshot.json"), &json)
    }

    /// Human-readable listing of every record, sorted by id.
    pub fn write_listing(&self) -> StoreResult<()> {
        let guard = self
            .cache
            .read()
            .map_err(|_| StoreError::Backend("cache lock poisoned".to_string()))?;
        let sorted: BTreeMap<&CandidateId, &Candidate> = guard.iter().collect();

        let mut out = String::new();
        for (id, c) in sorted {
            out.push_str(&format!("{id}\n"));
            out.push_str(&format!("    state: {}\n", c.state));
            out.push_str(&format!("    rate: {:e}\n", c.rate));
            out.push_str(&format!("    pipeline: {}\n", c.pipeline));
            out.push_str(&format!("    category: {}\n", c.category));
            out.push_str(&format!(
                "    labels: {}\n",
                c.labels.iter().cloned().collect::<Vec<_>>().join(",")
            ));
            for (gate, outcome) in &c.gate_results {
                out.push_str(&format!("    gate {gate}: {outcome}\n"));
            }
            for sent in &c.sent {
                out.push_str(&format!(
                    "    sent #{}: {} (internal: {})\n",
                    sent.sequence, sent.kind, sent.internal
                ));
            }
            for failed in &c.failed {
                out.push_str(&format!("    failed: {} ({})\n", failed.kind, failed.error));
            }
            if let Some(artifact) = c.current_artifact() {
                out.push_str(&format!("    current artifact: {}\n", artifact.label));
            }
            out.push('\n');
        }
        Self::write_atomic(&self.root.join("candidates.txt"), &out)
    }
}

#[async_trait]
impl CandidateStore for FileCandidateStore {
    async fn lookup(&self, id: &CandidateId) -> StoreResult<Option<Candidate>> {
        let guard = self
            .cache
            .read()
            .map_err(|_| StoreError::Backend("cache lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn lookup_or_create(&self, seed: &NewCandidate) -> StoreResult<Candidate> {
        let mut guard = self
            .cache
            .write()
            .map_err(|_| StoreError::Backend("cache lock poisoned".to_string()))?;
        if let Some(existing) = guard.get(&seed.id) {
            return Ok(existing.clone());
        }
        let candidate = Candidate::new(seed);
        let json = serde_json::to_string_pretty(&candidate)?;
        Self::write_atomic(&self.record_path(&seed.id)?, &json)?;
        guard.insert(seed.id.clone(), candidate.clone());
        debug!(id = %seed.id, "created candidate record");
        Ok(candidate)
    }

    async fn persist(&self, candidate: &Candidate) -> StoreResult<()> {
        let mut guard = self
            .cache
            .write()
            .map_err(|_| StoreError::Backend("cache lock poisoned".to_string()))?;
        let json = serde_json::to_string_pretty(candidate)?;
        Self::write_atomic(&self.record_path(&candidate.id)?, &json)?;
        guard.insert(candidate.id.clone(), candidate.clone());
        Ok(())
    }

    async fn list_ids(&self) -> StoreResult<Vec<CandidateId>> {
        let guard = self
            .cache
            .read()
            .map_err(|_| StoreError::Backend("cache lock poisoned".to_string()))?;
        let mut ids: Vec<_> = guard.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn sync_views(&self) -> StoreResult<()> {
        self.write_snapshot()?;
        self.write_listing()
    }
}
