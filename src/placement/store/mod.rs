//! Student Store
//!
//! Persistence of the student aggregate. The only write path after admission
//! is [`StudentStore::compare_and_swap`], which commits a whole new snapshot
//! if and only if the stored version still equals the version it was computed
//! from.

pub mod memory;
pub mod pg;

pub use memory::InMemoryStudentStore;
pub use pg::PgStudentStore;

use async_trait::async_trait;

use super::error::PlacementError;
use super::types::{PromotionRecord, Student, StudentId, TransferRecord};

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Get store name for logging
    fn name(&self) -> &'static str;

    async fn get(&self, id: &StudentId) -> Result<Option<Student>, PlacementError>;

    /// Admission path, used for seeding. Fails with `DuplicateStudent` if the id exists.
    async fn insert(&self, student: &Student) -> Result<(), PlacementError>;

    /// Atomic CAS: replace the stored student with `next` only if its stored
    /// version equals `expected_version`.
    ///
    /// Returns `Ok(false)` on version mismatch, `StudentNotFound` if the id is
    /// unknown, and `HistoryRewrite` if `next` does not extend the stored
    /// histories.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        next: &Student,
    ) -> Result<bool, PlacementError>;
}

/// Commit-time checks shared by every store implementation
pub(crate) fn check_commit(
    stored: &Student,
    expected_version: u64,
    next: &Student,
) -> Result<(), PlacementError> {
    check_version_step(expected_version, next)?;
    check_history_extends(&stored.transfer_history, &stored.promotion_history, next)
}

pub(crate) fn check_version_step(
    expected_version: u64,
    next: &Student,
) -> Result<(), PlacementError> {
    if next.version != expected_version + 1 {
        return Err(PlacementError::SystemError(format!(
            "commit for {} must advance version {} by exactly one, got {}",
            next.id, expected_version, next.version
        )));
    }
    Ok(())
}

/// `next` must keep every stored record, unchanged and in order, as its prefix
pub(crate) fn check_history_extends(
    stored_transfers: &[TransferRecord],
    stored_promotions: &[PromotionRecord],
    next: &Student,
) -> Result<(), PlacementError> {
    let transfers_extend = next.transfer_history.starts_with(stored_transfers);
    let promotions_extend = next.promotion_history.starts_with(stored_promotions);

    if !transfers_extend || !promotions_extend {
        return Err(PlacementError::HistoryRewrite(next.id.clone()));
    }
    Ok(())
}
