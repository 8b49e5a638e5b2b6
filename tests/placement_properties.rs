use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use student_placement::placement::{
    Actor, BatchTarget, GradeCatalog, GradeCode, GuardConfig, InMemoryStudentStore,
    PlacementError, PlacementKey, PlacementService, StreamSection, Student, StudentId,
    TransferRequest, TransferValidator, audit_channel,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

async fn service_with(ids: &[String]) -> PlacementService {
    let (audit_tx, _audit_rx) = audit_channel(16);
    let service = PlacementService::new(
        Arc::new(InMemoryStudentStore::new()),
        TransferValidator::new(GradeCatalog::Lenient),
        GuardConfig {
            lock_timeout: Duration::from_secs(5),
            max_conflict_retries: 3,
        },
        4,
        audit_tx,
    );
    for id in ids {
        let student = Student::admit(
            StudentId::new(id.as_str()).unwrap(),
            "Prop Student",
            "Junior Secondary",
            PlacementKey::new(GradeCode::new("JSS1").unwrap(), StreamSection::new("A").unwrap()),
        );
        service.admit(&student).await.unwrap();
    }
    service
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reason_is_stored_verbatim(reason in any::<String>()) {
        let rt = runtime();
        let stored = rt.block_on(async {
            let service = service_with(&["STU-1".to_string()]).await;
            let req = TransferRequest::new("JSS1", "B").with_reason(reason.clone());
            service
                .transfer(&StudentId::new("STU-1").unwrap(), &req, &Actor::new("prop"))
                .await
                .unwrap()
                .transfer_history[0]
                .reason
                .clone()
        });

        if reason.is_empty() {
            prop_assert_eq!(stored, "Internal transfer");
        } else {
            prop_assert_eq!(stored, reason);
        }
    }

    #[test]
    fn batch_counts_partition_distinct_ids(
        picks in prop::collection::vec(0usize..12, 0..30)
    ) {
        // 0..6 exist, 6..12 do not
        let known: Vec<String> = (0..6).map(|i| format!("STU-{}", i)).collect();
        let requested: Vec<String> = picks.iter().map(|i| format!("STU-{}", i)).collect();

        let rt = runtime();
        let outcome = rt.block_on(async {
            let service = service_with(&known).await;
            let target = BatchTarget::Internal(TransferRequest::new("JSS2", "B"));
            service.batch_transfer(&requested, &target, &Actor::new("prop")).await
        });

        let distinct: HashSet<&String> = requested.iter().collect();
        let expected_ok = distinct.iter().filter(|id| known.contains(**id)).count();

        prop_assert_eq!(outcome.transferred_count + outcome.errors.len(), distinct.len());
        prop_assert_eq!(outcome.transferred_count, expected_ok);
        prop_assert_eq!(outcome.succeeded_ids.len(), outcome.transferred_count);

        let failed: HashSet<&String> = outcome.errors.iter().map(|e| &e.id).collect();
        for id in &outcome.succeeded_ids {
            prop_assert!(!failed.contains(&id));
        }
    }

    #[test]
    fn sequential_transfers_chain_history(
        sections in prop::collection::vec(prop::sample::select(vec!["A", "B", "C"]), 1..20)
    ) {
        let rt = runtime();
        let (student, successes) = rt.block_on(async {
            let service = service_with(&["STU-1".to_string()]).await;
            let id = StudentId::new("STU-1").unwrap();
            let actor = Actor::new("prop");
            let mut successes = 0u64;
            for section in &sections {
                match service.transfer(&id, &TransferRequest::new("JSS1", *section), &actor).await {
                    Ok(_) => successes += 1,
                    Err(PlacementError::AlreadyAtTarget { .. }) => {}
                    Err(e) => panic!("unexpected error: {}", e),
                }
            }
            (service.get_student(&id).await.unwrap(), successes)
        });

        prop_assert_eq!(student.version, successes);
        prop_assert_eq!(student.transfer_history.len() as u64, successes);

        let mut current = "A".to_string();
        for record in &student.transfer_history {
            prop_assert_eq!(record.from_section.as_str(), current.as_str());
            prop_assert_ne!(record.from_section.as_str(), record.to_section.as_str());
            current = record.to_section.to_string();
        }
        prop_assert_eq!(student.stream_section.as_str(), current.as_str());
    }
}
