//! Promotion Executor
//!
//! Grade promotion and graduation. Same contract as the transfer executor:
//! pure, one history append per promotion, version left to the guard.

use super::state::StudentStatus;
use super::types::{Actor, PromotionRecord, Student, commit_timestamp, new_record_id};
use super::validator::{ValidatedGraduation, ValidatedPromotion};

pub struct PromotionExecutor;

impl PromotionExecutor {
    pub fn promote(
        student: &Student,
        promotion: &ValidatedPromotion,
        actor: &Actor,
    ) -> (Student, PromotionRecord) {
        let now = commit_timestamp();
        let record = PromotionRecord {
            record_id: new_record_id(),
            from_grade: student.grade_code.clone(),
            to_grade: promotion.to_grade.clone(),
            academic_year: promotion.academic_year.clone(),
            reason: promotion.reason.clone(),
            performed_by: actor.clone(),
            timestamp: now,
        };

        let mut next = student.clone();
        next.grade_code = promotion.to_grade.clone();
        if let Some(stage) = &promotion.to_stage {
            next.stage = stage.clone();
        }
        next.promotion_history.push(record.clone());
        next.updated_at = now;

        (next, record)
    }

    /// Terminal transition; placement and histories are kept as they were
    pub fn graduate(student: &Student, graduation: &ValidatedGraduation) -> Student {
        let mut next = student.clone();
        next.status = StudentStatus::Graduated;
        next.graduation_year = Some(graduation.graduation_year);
        next.clearance_status = Some(graduation.clearance_status.clone());
        next.updated_at = commit_timestamp();
        next
    }
}
