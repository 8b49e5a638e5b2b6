//! Placement Service
//!
//! Entry point for every placement operation. Owns the store, the
//! concurrency guard, the validator, the audit sender and the batch
//! coordinator, and drives each request through
//! validate -> guard -> executor -> commit -> audit.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::audit::{AuditEvent, AuditSender};
use super::batch::{BatchCoordinator, BatchOutcome, BatchTarget, TransferPipeline};
use super::error::PlacementError;
use super::executor::TransferExecutor;
use super::guard::{ConcurrencyGuard, GuardConfig};
use super::promotion::PromotionExecutor;
use super::store::StudentStore;
use super::types::{
    Actor, ExternalTransferRequest, GraduationRequest, PromotionRecord, PromotionRequest, Student,
    StudentId, TransferRecord, TransferRequest, WithdrawalRequest,
};
use super::validator::TransferValidator;

pub struct PlacementService {
    store: Arc<dyn StudentStore>,
    guard: ConcurrencyGuard,
    validator: TransferValidator,
    audit: AuditSender,
    batch: BatchCoordinator,
}

impl PlacementService {
    pub fn new(
        store: Arc<dyn StudentStore>,
        validator: TransferValidator,
        guard_config: GuardConfig,
        batch_concurrency: usize,
        audit: AuditSender,
    ) -> Self {
        Self {
            guard: ConcurrencyGuard::new(store.clone(), guard_config),
            store,
            validator,
            audit,
            batch: BatchCoordinator::new(batch_concurrency),
        }
    }

    pub fn store(&self) -> &Arc<dyn StudentStore> {
        &self.store
    }

    pub fn validator(&self) -> &TransferValidator {
        &self.validator
    }

    /// Admit a new student (seeding path)
    pub async fn admit(&self, student: &Student) -> Result<(), PlacementError> {
        self.store.insert(student).await?;
        debug!(student_id = %student.id, placement = %student.placement_key(), "Student admitted");
        Ok(())
    }

    pub async fn get_student(&self, id: &StudentId) -> Result<Student, PlacementError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| PlacementError::StudentNotFound(id.clone()))
    }

    pub async fn transfer_history(
        &self,
        id: &StudentId,
    ) -> Result<Vec<TransferRecord>, PlacementError> {
        Ok(self.get_student(id).await?.transfer_history)
    }

    pub async fn promotion_history(
        &self,
        id: &StudentId,
    ) -> Result<Vec<PromotionRecord>, PlacementError> {
        Ok(self.get_student(id).await?.promotion_history)
    }

    /// Internal transfer to another grade/section
    pub async fn transfer(
        &self,
        id: &StudentId,
        req: &TransferRequest,
        actor: &Actor,
    ) -> Result<Student, PlacementError> {
        let (student, record) = self
            .guard
            .with_lock(id, |current| {
                let validated = self.validator.validate(current, req)?;
                Ok(TransferExecutor::apply(current, &validated, actor))
            })
            .await?;

        info!(
            student_id = %id,
            from_grade = ?record.from_grade.as_ref().map(|g| g.as_str()),
            from_section = %record.from_section,
            to = %student.placement_key(),
            version = student.version,
            performed_by = %actor,
            "Internal transfer committed"
        );
        self.audit.publish(AuditEvent::Transfer {
            student_id: id.clone(),
            record,
        });
        Ok(student)
    }

    /// Transfer to another school; the student becomes `transferred`
    pub async fn external_transfer(
        &self,
        id: &StudentId,
        req: &ExternalTransferRequest,
        actor: &Actor,
    ) -> Result<Student, PlacementError> {
        let (student, record) = self
            .guard
            .with_lock(id, |current| {
                let validated = self.validator.validate_external(current, req)?;
                Ok(TransferExecutor::apply_external(current, &validated, actor))
            })
            .await?;

        info!(
            student_id = %id,
            target_school_id = ?record.target_school_id,
            version = student.version,
            performed_by = %actor,
            "External transfer committed"
        );
        self.audit.publish(AuditEvent::Transfer {
            student_id: id.clone(),
            record,
        });
        Ok(student)
    }

    pub async fn promote(
        &self,
        id: &StudentId,
        req: &PromotionRequest,
        actor: &Actor,
    ) -> Result<Student, PlacementError> {
        let (student, record) = self
            .guard
            .with_lock(id, |current| {
                let validated = self.validator.validate_promotion(current, req)?;
                Ok(PromotionExecutor::promote(current, &validated, actor))
            })
            .await?;

        info!(
            student_id = %id,
            from_grade = %record.from_grade,
            to_grade = %record.to_grade,
            academic_year = %record.academic_year,
            version = student.version,
            "Promotion committed"
        );
        self.audit.publish(AuditEvent::Promotion {
            student_id: id.clone(),
            record,
        });
        Ok(student)
    }

    pub async fn graduate(
        &self,
        id: &StudentId,
        req: &GraduationRequest,
        actor: &Actor,
    ) -> Result<Student, PlacementError> {
        let (student, ()) = self
            .guard
            .with_lock(id, |current| {
                let validated = self.validator.validate_graduation(current, req)?;
                Ok((PromotionExecutor::graduate(current, &validated), ()))
            })
            .await?;

        info!(
            student_id = %id,
            graduation_year = req.graduation_year,
            version = student.version,
            "Graduation committed"
        );
        self.audit.publish(AuditEvent::Graduation {
            student_id: id.clone(),
            graduation_year: req.graduation_year,
            clearance_status: req.clearance_status.clone(),
            performed_by: actor.clone(),
            timestamp: student.updated_at,
        });
        Ok(student)
    }

    pub async fn withdraw(
        &self,
        id: &StudentId,
        req: &WithdrawalRequest,
        actor: &Actor,
    ) -> Result<Student, PlacementError> {
        let (student, ()) = self
            .guard
            .with_lock(id, |current| {
                let validated = self.validator.validate_withdrawal(current, req)?;
                Ok((TransferExecutor::apply_withdrawal(current, &validated), ()))
            })
            .await?;

        info!(student_id = %id, version = student.version, "Withdrawal committed");
        self.audit.publish(AuditEvent::Withdrawal {
            student_id: id.clone(),
            reason: req.reason.clone(),
            performed_by: actor.clone(),
            timestamp: student.updated_at,
        });
        Ok(student)
    }

    /// Apply one target to many students; never fails as a whole
    pub async fn batch_transfer(
        &self,
        ids: &[String],
        target: &BatchTarget,
        actor: &Actor,
    ) -> BatchOutcome {
        self.batch.run(self, ids, target, actor).await
    }
}

#[async_trait]
impl TransferPipeline for PlacementService {
    async fn transfer_one(
        &self,
        id: &StudentId,
        target: &BatchTarget,
        actor: &Actor,
    ) -> Result<Student, PlacementError> {
        match target {
            BatchTarget::Internal(req) => self.transfer(id, req, actor).await,
            BatchTarget::External(req) => self.external_transfer(id, req, actor).await,
        }
    }
}
