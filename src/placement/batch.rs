//! Batch Coordinator
//!
//! Fans a batch transfer out over independent students. Each distinct id
//! runs through the same pipeline as a single transfer; per-student failures
//! are collected and never abort the rest of the batch.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tracing::{debug, info};

use super::error::PlacementError;
use super::types::{Actor, ExternalTransferRequest, Student, StudentId, TransferRequest};

/// Common target applied to every student of a batch
#[derive(Debug, Clone)]
pub enum BatchTarget {
    Internal(TransferRequest),
    External(ExternalTransferRequest),
}

/// Single-student pipeline the coordinator drives once per id
#[async_trait]
pub trait TransferPipeline: Send + Sync {
    async fn transfer_one(
        &self,
        id: &StudentId,
        target: &BatchTarget,
        actor: &Actor,
    ) -> Result<Student, PlacementError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItemError {
    pub id: String,
    pub message: String,
}

/// Per-student outcome of a batch, in first-occurrence order of the input ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub transferred_count: usize,
    pub succeeded_ids: Vec<String>,
    pub errors: Vec<BatchItemError>,
}

pub struct BatchCoordinator {
    concurrency: usize,
}

impl BatchCoordinator {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn run<P>(
        &self,
        pipeline: &P,
        ids: &[String],
        target: &BatchTarget,
        actor: &Actor,
    ) -> BatchOutcome
    where
        P: TransferPipeline + ?Sized,
    {
        let distinct = dedup_preserving_order(ids);
        if distinct.is_empty() {
            return BatchOutcome::default();
        }

        let results: Vec<(String, Result<Student, PlacementError>)> = stream::iter(distinct)
            .map(|raw| async move {
                let result = match StudentId::new(raw.as_str()) {
                    Ok(id) => pipeline.transfer_one(&id, target, actor).await,
                    Err(e) => Err(e),
                };
                (raw, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut outcome = BatchOutcome::default();
        for (id, result) in results {
            match result {
                Ok(_) => outcome.succeeded_ids.push(id),
                Err(e) => {
                    debug!(student_id = %id, error = %e, "Batch item failed");
                    outcome.errors.push(BatchItemError {
                        id,
                        message: e.to_string(),
                    });
                }
            }
        }
        outcome.transferred_count = outcome.succeeded_ids.len();

        info!(
            requested = ids.len(),
            transferred = outcome.transferred_count,
            failed = outcome.errors.len(),
            "Batch transfer finished"
        );
        outcome
    }
}

fn dedup_preserving_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Mock pipeline for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::placement::types::{GradeCode, PlacementKey, StreamSection};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub struct MockPipeline {
        known: HashSet<String>,
        delay: Duration,
        pub calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl MockPipeline {
        pub fn new<I: IntoIterator<Item = &'static str>>(known: I) -> Self {
            Self {
                known: known.into_iter().map(String::from).collect(),
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl TransferPipeline for MockPipeline {
        async fn transfer_one(
            &self,
            id: &StudentId,
            _target: &BatchTarget,
            _actor: &Actor,
        ) -> Result<Student, PlacementError> {
            self.calls.lock().unwrap().push(id.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if !self.known.contains(id.as_str()) {
                return Err(PlacementError::StudentNotFound(id.clone()));
            }
            Ok(Student::admit(
                id.clone(),
                "Mock",
                "Junior Secondary",
                PlacementKey::new(GradeCode::new("JSS2").unwrap(), StreamSection::new("B").unwrap()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPipeline;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};

    fn target() -> BatchTarget {
        BatchTarget::Internal(TransferRequest::new("JSS2", "B"))
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pipeline = MockPipeline::new([]);
        let outcome = BatchCoordinator::new(4)
            .run(&pipeline, &[], &target(), &Actor::new("a"))
            .await;
        assert_eq!(outcome, BatchOutcome::default());
        assert!(pipeline.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_collected_and_batch_continues() {
        let pipeline = MockPipeline::new(["S1", "S3"]);
        let outcome = BatchCoordinator::new(4)
            .run(&pipeline, &ids(&["S1", "S2", "S3", "S4"]), &target(), &Actor::new("a"))
            .await;

        assert_eq!(outcome.transferred_count, 2);
        assert_eq!(outcome.succeeded_ids, ids(&["S1", "S3"]));
        let failed: Vec<_> = outcome.errors.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(failed, vec!["S2", "S4"]);
        assert!(outcome.errors[0].message.contains("not found"));
    }

    #[tokio::test]
    async fn test_duplicates_processed_once() {
        let pipeline = MockPipeline::new(["S1", "S2"]);
        let outcome = BatchCoordinator::new(4)
            .run(&pipeline, &ids(&["S1", "S2", "S1", "S1"]), &target(), &Actor::new("a"))
            .await;

        assert_eq!(outcome.transferred_count, 2);
        assert_eq!(outcome.succeeded_ids, ids(&["S1", "S2"]));
        assert!(outcome.errors.is_empty());
        assert_eq!(pipeline.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_id_reported_without_calling_pipeline() {
        let pipeline = MockPipeline::new(["S1"]);
        let outcome = BatchCoordinator::new(2)
            .run(&pipeline, &ids(&["", "S1"]), &target(), &Actor::new("a"))
            .await;

        assert_eq!(outcome.transferred_count, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].id, "");
        assert_eq!(*pipeline.calls.lock().unwrap(), ids(&["S1"]));
    }

    #[tokio::test]
    async fn test_counts_partition_distinct_ids() {
        let known = ["A", "B", "C", "D", "E"];
        let pipeline = MockPipeline::new(known);
        let input = ids(&["A", "X", "B", "Y", "C", "A", "Z", "D", "E", "X"]);
        let outcome = BatchCoordinator::new(3)
            .run(&pipeline, &input, &target(), &Actor::new("a"))
            .await;

        assert_eq!(outcome.transferred_count + outcome.errors.len(), 8);
        assert_eq!(outcome.transferred_count, 5);
        let failed: HashSet<_> = outcome.errors.iter().map(|e| e.id.clone()).collect();
        assert!(outcome.succeeded_ids.iter().all(|id| !failed.contains(id)));
    }

    #[tokio::test]
    async fn test_runs_concurrently_within_bound() {
        let names: Vec<&'static str> = (0..40)
            .map(|i| &*Box::leak(format!("S{}", i).into_boxed_str()))
            .collect();
        let pipeline = MockPipeline::new(names.clone()).with_delay(Duration::from_millis(20));
        let input: Vec<String> = names.iter().map(|s| s.to_string()).collect();

        let start = Instant::now();
        let outcome = BatchCoordinator::new(8)
            .run(&pipeline, &input, &target(), &Actor::new("a"))
            .await;
        let elapsed = start.elapsed();

        assert_eq!(outcome.transferred_count, 40);
        // 40 x 20ms sequentially would be 800ms
        assert!(elapsed < Duration::from_millis(500), "took {:?}", elapsed);
        assert!(pipeline.max_in_flight.load(Ordering::SeqCst) <= 8);
        assert_eq!(outcome.succeeded_ids, input);
    }
}
