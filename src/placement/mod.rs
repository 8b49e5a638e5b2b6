//! Student Placement
//!
//! Grade/section transfers, transfers to other schools, promotion and
//! graduation, each recorded in an append-only history and committed with a
//! single compare-and-swap on the student's `version`.
//!
//! # Pipeline
//!
//! ```text
//! request → ConcurrencyGuard.with_lock(id)
//!             ├─ read current student
//!             ├─ TransferValidator      (pure, against the fresh read)
//!             ├─ Transfer/PromotionExecutor (pure, one history append)
//!             └─ StudentStore.compare_and_swap(read.version, next)
//!         → AuditSender.publish (fire-and-forget)
//! ```
//!
//! # Status Machine
//!
//! ```text
//! ACTIVE ──internal transfer──► ACTIVE (different placement)
//!   │  ├──external transfer──► TRANSFERRED
//!   │  ├──graduation─────────► GRADUATED
//!   │  └──withdrawal─────────► WITHDRAWN
//! INACTIVE / SUSPENDED behave like ACTIVE for placement changes
//! ```
//!
//! # Invariants
//!
//! 1. A transfer to the current placement is rejected (`AlreadyAtTarget`)
//! 2. Histories only grow; committed records are never edited or reordered
//! 3. Exactly one record per successful transfer or promotion
//! 4. `version` advances by exactly 1 per commit, never against a stale read

pub mod api;
pub mod audit;
pub mod batch;
pub mod error;
pub mod executor;
pub mod guard;
pub mod promotion;
pub mod service;
pub mod state;
pub mod store;
pub mod types;
pub mod validator;


// Re-exports for convenience
pub use api::{BatchTransferRequest, BatchTransferResponse, StudentResponse};
pub use audit::{AuditEvent, AuditReceiver, AuditSender, audit_channel, spawn_audit_logger};
pub use batch::{BatchCoordinator, BatchOutcome, BatchTarget, TransferPipeline};
pub use error::PlacementError;
pub use executor::TransferExecutor;
pub use guard::{ConcurrencyGuard, GuardConfig};
pub use promotion::PromotionExecutor;
pub use service::PlacementService;
pub use state::StudentStatus;
pub use store::{InMemoryStudentStore, PgStudentStore, StudentStore};
pub use types::{
    Actor, ExternalTransferRequest, GradeCode, GraduationRequest, PlacementKey, PromotionRecord,
    PromotionRequest, StreamSection, Student, StudentId, TransferRecord, TransferRequest,
    TransferType, WithdrawalRequest,
};
pub use validator::{GradeCatalog, TransferValidator};
