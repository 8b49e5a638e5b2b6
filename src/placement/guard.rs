//! Concurrency Guard
//!
//! Linearizes read-modify-write cycles per student.
//!
//! Two layers:
//! 1. A per-student `tokio::sync::Mutex` (created on demand, pruned when idle)
//!    serializes writers inside this process.
//! 2. The commit itself is a compare-and-swap on `version`, which catches
//!    writers from other processes sharing the same database.
//!
//! The mutation closure may run more than once when the CAS loses, so it must
//! be a pure function of the student snapshot it is given.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use super::error::PlacementError;
use super::store::StudentStore;
use super::types::{Student, StudentId};

#[derive(Debug, Clone, Copy)]
pub struct GuardConfig {
    /// How long a request may wait for a busy student before giving up
    pub lock_timeout: Duration,
    /// Re-read/re-apply attempts after a lost CAS before reporting `Conflict`
    pub max_conflict_retries: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            max_conflict_retries: 3,
        }
    }
}

pub struct ConcurrencyGuard {
    store: Arc<dyn StudentStore>,
    locks: DashMap<StudentId, Arc<Mutex<()>>>,
    config: GuardConfig,
}

/// Held for the duration of one guarded mutation. Dropping it releases the
/// student and prunes the lock entry once nobody else is waiting on it.
pub(crate) struct LockLease<'a> {
    locks: &'a DashMap<StudentId, Arc<Mutex<()>>>,
    id: StudentId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl ConcurrencyGuard {
    pub fn new(store: Arc<dyn StudentStore>, config: GuardConfig) -> Self {
        Self {
            store,
            locks: DashMap::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn StudentStore> {
        &self.store
    }

    /// Number of students with a live lock entry
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }

    pub(crate) async fn acquire(&self, id: &StudentId) -> Result<LockLease<'_>, PlacementError> {
        let mutex = self.locks.entry(id.clone()).or_default().value().clone();
        let mut lease = LockLease {
            locks: &self.locks,
            id: id.clone(),
            guard: None,
        };

        match tokio::time::timeout(self.config.lock_timeout, mutex.lock_owned()).await {
            Ok(guard) => {
                lease.guard = Some(guard);
                Ok(lease)
            }
            Err(_) => {
                warn!(
                    student_id = %id,
                    timeout_ms = self.config.lock_timeout.as_millis() as u64,
                    "Timed out waiting for student lock"
                );
                Err(PlacementError::LockTimeout(id.clone()))
            }
        }
    }

    /// Run `mutate` against the freshest read of the student and commit its
    /// result with a single CAS.
    ///
    /// The committed student always has `version == read.version + 1`; the
    /// closure's own `version` is ignored. Errors from `mutate` abort without
    /// writing anything.
    pub async fn with_lock<T, F>(
        &self,
        id: &StudentId,
        mutate: F,
    ) -> Result<(Student, T), PlacementError>
    where
        F: Fn(&Student) -> Result<(Student, T), PlacementError>,
    {
        let _lease = self.acquire(id).await?;
        let mut conflicts = 0u32;

        loop {
            let current = self
                .store
                .get(id)
                .await?
                .ok_or_else(|| PlacementError::StudentNotFound(id.clone()))?;

            let (mut next, output) = mutate(&current)?;
            next.version = current.version + 1;

            if self.store.compare_and_swap(current.version, &next).await? {
                debug!(
                    student_id = %id,
                    version = next.version,
                    retries = conflicts,
                    "Student commit applied"
                );
                return Ok((next, output));
            }

            conflicts += 1;
            warn!(
                student_id = %id,
                read_version = current.version,
                attempt = conflicts,
                store = self.store.name(),
                "Version conflict on commit"
            );

            if conflicts > self.config.max_conflict_retries {
                return Err(PlacementError::Conflict {
                    student_id: id.clone(),
                    read_version: current.version,
                });
            }
        }
    }
}
