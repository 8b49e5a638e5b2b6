//! Placement Core Types
//!
//! The student aggregate, its history records and the request shapes that
//! drive placement changes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::PlacementError;
use super::state::StudentStatus;

/// Reason stored when an internal transfer request carries none
pub const DEFAULT_INTERNAL_REASON: &str = "Internal transfer";

macro_rules! non_blank_string_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, PlacementError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(PlacementError::InvalidParameter(format!(
                        "{} must not be blank",
                        $what
                    )));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = PlacementError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = PlacementError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_blank_string_id!(
    /// Stable student identifier (admission number)
    StudentId,
    "student id"
);

non_blank_string_id!(
    /// Grade code such as `JSS2` or `PRY5`
    GradeCode,
    "grade code"
);

non_blank_string_id!(
    /// Stream section within a grade, e.g. `A` or `Science`
    StreamSection,
    "stream section"
);

/// The pair that identifies a student's class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementKey {
    pub grade_code: GradeCode,
    pub stream_section: StreamSection,
}

impl PlacementKey {
    pub fn new(grade_code: GradeCode, stream_section: StreamSection) -> Self {
        Self {
            grade_code,
            stream_section,
        }
    }
}

impl fmt::Display for PlacementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.grade_code, self.stream_section)
    }
}

/// Whether a transfer keeps the student in this school
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum TransferType {
    Internal = 1,
    External = 2,
}

impl TransferType {
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransferType::Internal),
            2 => Some(TransferType::External),
            _ => None,
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Internal => f.write_str("internal"),
            TransferType::External => f.write_str("external"),
        }
    }
}

/// Identity of whoever performed a placement change (JWT subject)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One appended entry of `transfer_history`. Never edited after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub record_id: String,
    pub from_section: StreamSection,
    pub to_section: StreamSection,
    pub from_grade: Option<GradeCode>,
    pub to_grade: Option<GradeCode>,
    pub reason: String,
    #[serde(rename = "type")]
    pub transfer_type: TransferType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_school_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub performed_by: Actor,
}

/// One appended entry of `promotion_history`. Never edited after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRecord {
    pub record_id: String,
    pub from_grade: GradeCode,
    pub to_grade: GradeCode,
    pub academic_year: String,
    pub reason: Option<String>,
    pub performed_by: Actor,
    pub timestamp: DateTime<Utc>,
}

/// Exit details recorded when a student leaves the school
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitDetails {
    pub target_school_id: Option<String>,
    pub exit_reason: String,
    pub clearance_documents: Vec<String>,
}

/// Student aggregate root, owned by the `StudentStore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub stage: String,
    pub grade_code: GradeCode,
    pub stream_section: StreamSection,
    pub status: StudentStatus,
    pub transfer_history: Vec<TransferRecord>,
    pub promotion_history: Vec<PromotionRecord>,
    pub graduation_year: Option<i32>,
    pub clearance_status: Option<String>,
    pub exit: Option<ExitDetails>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// New active student with empty histories at version 0
    pub fn admit(
        id: StudentId,
        full_name: impl Into<String>,
        stage: impl Into<String>,
        placement: PlacementKey,
    ) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            stage: stage.into(),
            grade_code: placement.grade_code,
            stream_section: placement.stream_section,
            status: StudentStatus::Active,
            transfer_history: Vec::new(),
            promotion_history: Vec::new(),
            graduation_year: None,
            clearance_status: None,
            exit: None,
            version: 0,
            updated_at: commit_timestamp(),
        }
    }

    pub fn placement_key(&self) -> PlacementKey {
        PlacementKey::new(self.grade_code.clone(), self.stream_section.clone())
    }

    pub fn is_at(&self, key: &PlacementKey) -> bool {
        self.grade_code == key.grade_code && self.stream_section == key.stream_section
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Student[{}] {} {} status={} v{}",
            self.id,
            self.stage,
            self.placement_key(),
            self.status,
            self.version
        )
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Internal transfer to another grade/section of the same school
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[schema(example = "JSS2")]
    pub new_grade_code: String,
    #[schema(example = "B")]
    pub new_stream_section: String,
    /// Optional new stage when the grade moves across stages
    #[serde(default)]
    pub new_stage: Option<String>,
    /// Defaults to "Internal transfer" when omitted or empty
    #[serde(default)]
    pub reason: Option<String>,
}

impl TransferRequest {
    pub fn new(grade_code: impl Into<String>, stream_section: impl Into<String>) -> Self {
        Self {
            new_grade_code: grade_code.into(),
            new_stream_section: stream_section.into(),
            new_stage: None,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Transfer out of this school
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTransferRequest {
    #[serde(default)]
    pub target_school_id: Option<String>,
    #[serde(default)]
    pub exit_reason: Option<String>,
    #[serde(default)]
    pub clearance_documents: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Move to the next grade level for an academic year
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRequest {
    #[schema(example = "JSS3")]
    pub to_grade: String,
    #[schema(example = "2025/2026")]
    pub academic_year: String,
    #[serde(default)]
    pub to_stage: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraduationRequest {
    #[schema(example = 2026)]
    pub graduation_year: i32,
    #[schema(example = "cleared")]
    pub clearance_status: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub reason: String,
}

/// New ULID for a history record
pub(crate) fn new_record_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Current time at the microsecond precision the Postgres store keeps
pub(crate) fn commit_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(grade: &str, section: &str) -> PlacementKey {
        PlacementKey::new(GradeCode::new(grade).unwrap(), StreamSection::new(section).unwrap())
    }

    #[test]
    fn test_ids_reject_blank() {
        assert!(StudentId::new("").is_err());
        assert!(StudentId::new("   ").is_err());
        assert!(GradeCode::new("\t").is_err());
        assert_eq!(StudentId::new("STU-001").unwrap().as_str(), "STU-001");
        assert!("".parse::<StreamSection>().is_err());
    }

    #[test]
    fn test_ids_deserialize_with_validation() {
        let id: StudentId = serde_json::from_str("\"STU-9\"").unwrap();
        assert_eq!(id.to_string(), "STU-9");
        assert!(serde_json::from_str::<StudentId>("\"  \"").is_err());
    }

    #[test]
    fn test_transfer_type_roundtrip() {
        assert_eq!(TransferType::from_id(1), Some(TransferType::Internal));
        assert_eq!(TransferType::from_id(2), Some(TransferType::External));
        assert_eq!(TransferType::from_id(3), None);
        assert_eq!(
            serde_json::to_string(&TransferType::External).unwrap(),
            "\"external\""
        );
    }

    #[test]
    fn test_admit_student() {
        let student = Student::admit(
            StudentId::new("STU-001").unwrap(),
            "Ada Obi",
            "Junior Secondary",
            key("JSS1", "A"),
        );
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.version, 0);
        assert!(student.transfer_history.is_empty());
        assert!(student.is_at(&key("JSS1", "A")));
        assert!(!student.is_at(&key("JSS1", "B")));
    }

    #[test]
    fn test_request_defaults() {
        let req: TransferRequest =
            serde_json::from_str(r#"{"newGradeCode":"JSS2","newStreamSection":"B"}"#).unwrap();
        assert!(req.reason.is_none());
        assert!(req.new_stage.is_none());

        let ext: ExternalTransferRequest = serde_json::from_str("{}").unwrap();
        assert!(ext.target_school_id.is_none());
        assert!(ext.clearance_documents.is_empty());
    }

    #[test]
    fn test_record_serializes_type_field() {
        let record = TransferRecord {
            record_id: new_record_id(),
            from_section: StreamSection::new("A").unwrap(),
            to_section: StreamSection::new("B").unwrap(),
            from_grade: Some(GradeCode::new("JSS1").unwrap()),
            to_grade: Some(GradeCode::new("JSS1").unwrap()),
            reason: DEFAULT_INTERNAL_REASON.to_string(),
            transfer_type: TransferType::Internal,
            target_school_id: None,
            timestamp: Utc::now(),
            performed_by: Actor::new("admin-1"),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "internal");
        assert_eq!(json["fromSection"], "A");
        assert_eq!(json["performedBy"], "admin-1");
        assert!(json.get("targetSchoolId").is_none());
    }
}
