//! Student Status Definitions
//!
//! Status IDs are stored in PostgreSQL as SMALLINT.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Enrollment status of a student
///
/// Terminal statuses: GRADUATED, TRANSFERRED, WITHDRAWN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum StudentStatus {
    /// Placed in a class and attending
    Active = 1,

    /// On the roll but not attending (e.g. long leave)
    Inactive = 2,

    /// Temporarily barred from attending
    Suspended = 3,

    /// Terminal: completed the final grade
    Graduated = 10,

    /// Terminal: moved to another school
    Transferred = 20,

    /// Terminal: left without a receiving school
    Withdrawn = 30,
}

impl StudentStatus {
    /// Check if this is a terminal status (no more placement changes)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StudentStatus::Graduated | StudentStatus::Transferred | StudentStatus::Withdrawn
        )
    }

    /// Get the numeric status ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL status ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(StudentStatus::Active),
            2 => Some(StudentStatus::Inactive),
            3 => Some(StudentStatus::Suspended),
            10 => Some(StudentStatus::Graduated),
            20 => Some(StudentStatus::Transferred),
            30 => Some(StudentStatus::Withdrawn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Suspended => "suspended",
            StudentStatus::Graduated => "graduated",
            StudentStatus::Transferred => "transferred",
            StudentStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for StudentStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        StudentStatus::from_id(value).ok_or(())
    }
}
