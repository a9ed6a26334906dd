//! In-memory reference implementation of the candidate store.
//!
//! Deterministic and test-friendly. Production deployments use the
//! file-backed adapter for durable state.

use crate::traits::CandidateStore;
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use vigil_types::{Candidate, CandidateId, NewCandidate};

/// In-memory candidate store.
#[derive(Default)]
pub struct InMemoryCandidateStore {
    records: RwLock<HashMap<CandidateId, Candidate>>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn lookup(&self, id: &CandidateId) -> StoreResult<Option<Candidate>> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("records lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn lookup_or_create(&self, seed: &NewCandidate) -> StoreResult<Candidate> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("records lock poisoned".to_string()))?;
        let record = guard
            .entry(seed.id.clone())
            .or_insert_with(|| Candidate::new(seed));
        Ok(record.clone())
    }

    async fn persist(&self, candidate: &Candidate) -> StoreResult<()> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("records lock poisoned".to_string()))?;
        guard.insert(candidate.id.clone(), candidate.clone());
        Ok(())
    }

    async fn list_ids(&self) -> StoreResult<Vec<CandidateId>> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("records lock poisoned".to_string()))?;
        let mut ids: Vec<_> = guard.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
