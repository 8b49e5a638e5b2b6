//! Transfer Validator
//!
//! Pure precondition checks for every placement change. Each check runs
//! against the freshest read of the student taken under the concurrency
//! guard, so a validated request is always validated against the state it
//! will be applied to.

use std::collections::HashSet;

use super::error::PlacementError;
use super::types::{
    DEFAULT_INTERNAL_REASON, ExternalTransferRequest, GradeCode, GraduationRequest,
    PlacementKey, PromotionRequest, StreamSection, Student, TransferRequest, WithdrawalRequest,
};

/// School-scoped set of accepted grade codes
#[derive(Debug, Clone, Default)]
pub enum GradeCatalog {
    /// Any non-blank grade code is accepted and stored as-is
    #[default]
    Lenient,
    /// Only the configured grade codes are accepted
    Strict(HashSet<String>),
}

impl GradeCatalog {
    /// Build from config: an empty list means lenient
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes: HashSet<String> = codes.into_iter().map(Into::into).collect();
        if codes.is_empty() {
            GradeCatalog::Lenient
        } else {
            GradeCatalog::Strict(codes)
        }
    }

    pub fn parse(&self, raw: &str) -> Result<GradeCode, PlacementError> {
        let code = GradeCode::new(raw)?;
        match self {
            GradeCatalog::Lenient => Ok(code),
            GradeCatalog::Strict(codes) if codes.contains(code.as_str()) => Ok(code),
            GradeCatalog::Strict(_) => Err(PlacementError::UnknownGradeCode(raw.to_string())),
        }
    }
}

/// Internal transfer that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub target: PlacementKey,
    pub new_stage: Option<String>,
    pub reason: String,
}

/// External transfer that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedExternalTransfer {
    pub target_school_id: String,
    pub exit_reason: String,
    pub clearance_documents: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPromotion {
    pub to_grade: GradeCode,
    pub to_stage: Option<String>,
    pub academic_year: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedGraduation {
    pub graduation_year: i32,
    pub clearance_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWithdrawal {
    pub reason: String,
}

/// Precondition checks for placement changes
#[derive(Debug, Clone, Default)]
pub struct TransferValidator {
    catalog: GradeCatalog,
}

impl TransferValidator {
    pub fn new(catalog: GradeCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &GradeCatalog {
        &self.catalog
    }

    /// Validate an internal transfer against the current student state
    pub fn validate(
        &self,
        student: &Student,
        req: &TransferRequest,
    ) -> Result<ValidatedTransfer, PlacementError> {
        ensure_not_terminal(student)?;

        let target = PlacementKey::new(
            self.catalog.parse(&req.new_grade_code)?,
            StreamSection::new(req.new_stream_section.as_str())?,
        );

        if student.is_at(&target) {
            return Err(PlacementError::AlreadyAtTarget {
                student_id: student.id.clone(),
                grade_code: target.grade_code.to_string(),
                stream_section: target.stream_section.to_string(),
            });
        }

        Ok(ValidatedTransfer {
            target,
            new_stage: non_blank(req.new_stage.as_deref()),
            reason: resolve_reason(req.reason.as_deref()),
        })
    }

    /// Validate a transfer to another school
    pub fn validate_external(
        &self,
        student: &Student,
        req: &ExternalTransferRequest,
    ) -> Result<ValidatedExternalTransfer, PlacementError> {
        ensure_not_terminal(student)?;

        let target_school_id = non_blank(req.target_school_id.as_deref()).ok_or_else(|| {
            PlacementError::InvalidExternalTransferRequest(
                "target school id is required".to_string(),
            )
        })?;
        let exit_reason = non_blank(req.exit_reason.as_deref()).ok_or_else(|| {
            PlacementError::InvalidExternalTransferRequest("exit reason is required".to_string())
        })?;

        let reason = match req.reason.as_deref() {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => exit_reason.clone(),
        };

        Ok(ValidatedExternalTransfer {
            target_school_id,
            exit_reason,
            clearance_documents: req.clearance_documents.clone(),
            reason,
        })
    }

    pub fn validate_promotion(
        &self,
        student: &Student,
        req: &PromotionRequest,
    ) -> Result<ValidatedPromotion, PlacementError> {
        ensure_not_terminal(student)?;

        let to_grade = self.catalog.parse(&req.to_grade)?;
        if to_grade == student.grade_code {
            return Err(PlacementError::InvalidPromotion(format!(
                "student {} is already in grade {}",
                student.id, to_grade
            )));
        }

        let academic_year = non_blank(Some(req.academic_year.as_str())).ok_or_else(|| {
            PlacementError::InvalidPromotion("academic year is required".to_string())
        })?;

        Ok(ValidatedPromotion {
            to_grade,
            to_stage: non_blank(req.to_stage.as_deref()),
            academic_year,
            reason: req.reason.clone().filter(|r| !r.is_empty()),
        })
    }

    pub fn validate_graduation(
        &self,
        student: &Student,
        req: &GraduationRequest,
    ) -> Result<ValidatedGraduation, PlacementError> {
        ensure_not_terminal(student)?;

        if req.graduation_year <= 0 {
            return Err(PlacementError::InvalidParameter(format!(
                "graduation year must be positive, got {}",
                req.graduation_year
            )));
        }
        let clearance_status = non_blank(Some(req.clearance_status.as_str())).ok_or_else(|| {
            PlacementError::InvalidParameter("clearance status is required".to_string())
        })?;

        Ok(ValidatedGraduation {
            graduation_year: req.graduation_year,
            clearance_status,
        })
    }

    pub fn validate_withdrawal(
        &self,
        student: &Student,
        req: &WithdrawalRequest,
    ) -> Result<ValidatedWithdrawal, PlacementError> {
        ensure_not_terminal(student)?;

        if req.reason.trim().is_empty() {
            return Err(PlacementError::InvalidParameter(
                "withdrawal reason is required".to_string(),
            ));
        }

        Ok(ValidatedWithdrawal {
            reason: req.reason.clone(),
        })
    }
}

/// Omitted or empty reasons become the default; anything else is kept verbatim
pub fn resolve_reason(reason: Option<&str>) -> String {
    match reason {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => DEFAULT_INTERNAL_REASON.to_string(),
    }
}

fn ensure_not_terminal(student: &Student) -> Result<(), PlacementError> {
    if student.status.is_terminal() {
        return Err(PlacementError::NotTransferable {
            student_id: student.id.clone(),
            status: student.status,
        });
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}
