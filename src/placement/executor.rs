//! Transfer Executor
//!
//! Applies a validated transfer to a student snapshot and produces the next
//! aggregate state together with exactly one history record. Executors are
//! pure: the concurrency guard may call them again after a version conflict.
//! `version` is left untouched here; the guard advances it on commit.

use super::state::StudentStatus;
use super::types::{
    Actor, ExitDetails, Student, TransferRecord, TransferType, commit_timestamp, new_record_id,
};
use super::validator::{ValidatedExternalTransfer, ValidatedTransfer, ValidatedWithdrawal};

pub struct TransferExecutor;

impl TransferExecutor {
    /// Internal transfer: new grade/section, one `internal` record appended
    pub fn apply(
        student: &Student,
        transfer: &ValidatedTransfer,
        actor: &Actor,
    ) -> (Student, TransferRecord) {
        let now = commit_timestamp();
        let record = TransferRecord {
            record_id: new_record_id(),
            from_section: student.stream_section.clone(),
            to_section: transfer.target.stream_section.clone(),
            from_grade: Some(student.grade_code.clone()),
            to_grade: Some(transfer.target.grade_code.clone()),
            reason: transfer.reason.clone(),
            transfer_type: TransferType::Internal,
            target_school_id: None,
            timestamp: now,
            performed_by: actor.clone(),
        };

        let mut next = student.clone();
        next.grade_code = transfer.target.grade_code.clone();
        next.stream_section = transfer.target.stream_section.clone();
        if let Some(stage) = &transfer.new_stage {
            next.stage = stage.clone();
        }
        next.transfer_history.push(record.clone());
        next.updated_at = now;

        (next, record)
    }

    /// External transfer: status becomes `transferred`, placement is kept,
    /// one `external` record appended
    pub fn apply_external(
        student: &Student,
        transfer: &ValidatedExternalTransfer,
        actor: &Actor,
    ) -> (Student, TransferRecord) {
        let now = commit_timestamp();
        let record = TransferRecord {
            record_id: new_record_id(),
            from_section: student.stream_section.clone(),
            to_section: student.stream_section.clone(),
            from_grade: Some(student.grade_code.clone()),
            to_grade: None,
            reason: transfer.reason.clone(),
            transfer_type: TransferType::External,
            target_school_id: Some(transfer.target_school_id.clone()),
            timestamp: now,
            performed_by: actor.clone(),
        };

        let mut next = student.clone();
        next.status = StudentStatus::Transferred;
        next.exit = Some(ExitDetails {
            target_school_id: Some(transfer.target_school_id.clone()),
            exit_reason: transfer.exit_reason.clone(),
            clearance_documents: transfer.clearance_documents.clone(),
        });
        next.transfer_history.push(record.clone());
        next.updated_at = now;

        (next, record)
    }

    /// Withdrawal: status becomes `withdrawn`, no history record
    pub fn apply_withdrawal(student: &Student, withdrawal: &ValidatedWithdrawal) -> Student {
        let mut next = student.clone();
        next.status = StudentStatus::Withdrawn;
        next.exit = Some(ExitDetails {
            target_school_id: None,
            exit_reason: withdrawal.reason.clone(),
            clearance_documents: Vec::new(),
        });
        next.updated_at = commit_timestamp();
        next
    }
}
