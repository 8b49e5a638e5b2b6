//! Placement API Types
//!
//! Request and response shapes exposed over HTTP. Core types stay free of
//! schema annotations; these DTOs carry the OpenAPI metadata and the
//! camelCase wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::batch::{BatchOutcome, BatchTarget};
use super::types::{
    ExitDetails, ExternalTransferRequest, PromotionRecord, Student, TransferRecord,
    TransferRequest, TransferType,
};

// ============================================================================
// Batch Request/Response
// ============================================================================

fn default_transfer_type() -> TransferType {
    TransferType::Internal
}

/// One target applied to many students
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchTransferRequest {
    #[schema(example = json!(["STU-001", "STU-002"]))]
    pub student_ids: Vec<String>,
    /// Required for internal transfers
    #[serde(default)]
    #[schema(example = "JSS2")]
    pub new_grade_code: Option<String>,
    /// Required for internal transfers
    #[serde(default)]
    #[schema(example = "B")]
    pub new_stream_section: Option<String>,
    #[serde(default)]
    pub new_stage: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(rename = "type", default = "default_transfer_type")]
    pub transfer_type: TransferType,
    /// Required for external transfers
    #[serde(default)]
    pub target_school_id: Option<String>,
    /// Required for external transfers
    #[serde(default)]
    pub exit_reason: Option<String>,
    #[serde(default)]
    pub clearance_documents: Vec<String>,
}

impl BatchTransferRequest {
    /// Missing fields are left for per-student validation, so a malformed
    /// target shows up in `errors` rather than failing the request.
    pub fn target(&self) -> BatchTarget {
        match self.transfer_type {
            TransferType::Internal => BatchTarget::Internal(TransferRequest {
                new_grade_code: self.new_grade_code.clone().unwrap_or_default(),
                new_stream_section: self.new_stream_section.clone().unwrap_or_default(),
                new_stage: self.new_stage.clone(),
                reason: self.reason.clone(),
            }),
            TransferType::External => BatchTarget::External(ExternalTransferRequest {
                target_school_id: self.target_school_id.clone(),
                exit_reason: self.exit_reason.clone(),
                clearance_documents: self.clearance_documents.clone(),
                reason: self.reason.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchErrorResponse {
    #[schema(example = "STU-404")]
    pub id: String,
    #[schema(example = "Student not found: STU-404")]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchTransferResponse {
    /// Number of students actually transferred
    #[schema(example = 1)]
    pub transferred_students: usize,
    /// Ids that were transferred, in request order
    pub student_ids: Vec<String>,
    pub errors: Vec<BatchErrorResponse>,
}

impl From<BatchOutcome> for BatchTransferResponse {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            transferred_students: outcome.transferred_count,
            student_ids: outcome.succeeded_ids,
            errors: outcome
                .errors
                .into_iter()
                .map(|e| BatchErrorResponse {
                    id: e.id,
                    message: e.message,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Student Views
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecordResponse {
    pub record_id: String,
    pub from_section: String,
    pub to_section: String,
    pub from_grade: Option<String>,
    pub to_grade: Option<String>,
    pub reason: String,
    #[serde(rename = "type")]
    pub transfer_type: TransferType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_school_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub performed_by: String,
}

impl From<&TransferRecord> for TransferRecordResponse {
    fn from(r: &TransferRecord) -> Self {
        Self {
            record_id: r.record_id.clone(),
            from_section: r.from_section.to_string(),
            to_section: r.to_section.to_string(),
            from_grade: r.from_grade.as_ref().map(|g| g.to_string()),
            to_grade: r.to_grade.as_ref().map(|g| g.to_string()),
            reason: r.reason.clone(),
            transfer_type: r.transfer_type,
            target_school_id: r.target_school_id.clone(),
            timestamp: r.timestamp,
            performed_by: r.performed_by.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRecordResponse {
    pub record_id: String,
    pub from_grade: String,
    pub to_grade: String,
    pub academic_year: String,
    pub reason: Option<String>,
    pub performed_by: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&PromotionRecord> for PromotionRecordResponse {
    fn from(r: &PromotionRecord) -> Self {
        Self {
            record_id: r.record_id.clone(),
            from_grade: r.from_grade.to_string(),
            to_grade: r.to_grade.to_string(),
            academic_year: r.academic_year.clone(),
            reason: r.reason.clone(),
            performed_by: r.performed_by.to_string(),
            timestamp: r.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExitResponse {
    pub target_school_id: Option<String>,
    pub exit_reason: String,
    pub clearance_documents: Vec<String>,
}

impl From<&ExitDetails> for ExitResponse {
    fn from(e: &ExitDetails) -> Self {
        Self {
            target_school_id: e.target_school_id.clone(),
            exit_reason: e.exit_reason.clone(),
            clearance_documents: e.clearance_documents.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    #[schema(example = "STU-001")]
    pub id: String,
    pub full_name: String,
    pub stage: String,
    #[schema(example = "JSS2")]
    pub grade_code: String,
    #[schema(example = "B")]
    pub stream_section: String,
    /// active | inactive | suspended | graduated | transferred | withdrawn
    #[schema(example = "active")]
    pub status: String,
    pub transfer_history: Vec<TransferRecordResponse>,
    pub promotion_history: Vec<PromotionRecordResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clearance_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitResponse>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl From<&Student> for StudentResponse {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id.to_string(),
            full_name: s.full_name.clone(),
            stage: s.stage.clone(),
            grade_code: s.grade_code.to_string(),
            stream_section: s.stream_section.to_string(),
            status: s.status.as_str().to_string(),
            transfer_history: s.transfer_history.iter().map(Into::into).collect(),
            promotion_history: s.promotion_history.iter().map(Into::into).collect(),
            graduation_year: s.graduation_year,
            clearance_status: s.clearance_status.clone(),
            exit: s.exit.as_ref().map(Into::into),
            version: s.version,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::batch::BatchItemError;

    #[test]
    fn test_batch_request_defaults_to_internal() {
        let req: BatchTransferRequest = serde_json::from_str(
            r#"{"studentIds":["S1","S2"],"newGradeCode":"JSS2","newStreamSection":"B"}"#,
        )
        .unwrap();
        assert_eq!(req.transfer_type, TransferType::Internal);
        match req.target() {
            BatchTarget::Internal(t) => {
                assert_eq!(t.new_grade_code, "JSS2");
                assert!(t.reason.is_none());
            }
            BatchTarget::External(_) => panic!("expected internal target"),
        }
    }

    #[test]
    fn test_batch_request_external() {
        let req: BatchTransferRequest = serde_json::from_str(
            r#"{"studentIds":["S1"],"type":"external","targetSchoolId":"SCH-9","exitReason":"relocation"}"#,
        )
        .unwrap();
        match req.target() {
            BatchTarget::External(t) => {
                assert_eq!(t.target_school_id.as_deref(), Some("SCH-9"));
                assert_eq!(t.exit_reason.as_deref(), Some("relocation"));
            }
            BatchTarget::Internal(_) => panic!("expected external target"),
        }
    }

    #[test]
    fn test_batch_response_wire_shape() {
        let outcome = BatchOutcome {
            transferred_count: 1,
            succeeded_ids: vec!["S1".into()],
            errors: vec![BatchItemError {
                id: "S2".into(),
                message: "Student not found: S2".into(),
            }],
        };
        let json = serde_json::to_value(BatchTransferResponse::from(outcome)).unwrap();
        assert_eq!(json["transferredStudents"], 1);
        assert_eq!(json["studentIds"][0], "S1");
        assert_eq!(json["errors"][0]["id"], "S2");
    }
}
