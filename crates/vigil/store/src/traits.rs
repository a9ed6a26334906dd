use crate::StoreResult;
use async_trait::async_trait;
use vigil_types::{Candidate, CandidateId, NewCandidate};

/// Storage contract for candidate records.
///
/// `persist` must serialize concurrent writes to the same candidate key;
/// writes to different candidates may run in parallel.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Fetch one candidate by id.
    async fn lookup(&self, id: &CandidateId) -> StoreResult<Option<Candidate>>;

    /// Fetch the candidate for the seed's id, creating a fresh record on
    /// first sighting. Re-delivery of the same seed returns the existing
    /// record untouched.
    async fn lookup_or_create(&self, seed: &NewCandidate) -> StoreResult<Candidate>;

    /// Write one candidate record back.
    async fn persist(&self, candidate: &Candidate) -> StoreResult<()>;

    /// All known candidate ids, sorted.
    async fn list_ids(&self) -> StoreResult<Vec<CandidateId>>;

    /// Refresh any derived views (snapshot dump, human-readable listing).
    /// Adapters without derived views do nothing.
    async fn sync_views(&self) -> StoreResult<()> {
        Ok(())
    }
}
