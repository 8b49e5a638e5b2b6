use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::placement::{
    GradeCatalog, GradeCode, GuardConfig, PlacementKey, StreamSection, Student, StudentId,
    StudentStatus,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// HS256 secret used to verify caller tokens
    pub jwt_secret: String,
    /// PostgreSQL connection URL; the in-memory store is used when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub placement: PlacementConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlacementConfig {
    pub lock_timeout_ms: u64,
    pub max_conflict_retries: u32,
    pub batch_concurrency: usize,
    pub audit_queue_size: usize,
    /// Accepted grade codes; empty means any non-blank code
    #[serde(default)]
    pub grade_codes: Vec<String>,
    /// YAML list of students loaded into the in-memory store at start-up
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2000,
            max_conflict_retries: 3,
            batch_concurrency: 8,
            audit_queue_size: 1024,
            grade_codes: Vec::new(),
            seed_file: None,
        }
    }
}

impl PlacementConfig {
    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            max_conflict_retries: self.max_conflict_retries,
        }
    }

    pub fn grade_catalog(&self) -> GradeCatalog {
        GradeCatalog::from_codes(self.grade_codes.iter().cloned())
    }

    /// Seed file to load at start-up. Seeding only applies to the in-memory store.
    pub fn seed_file_for(&self, uses_postgres: bool) -> Option<&str> {
        if uses_postgres {
            None
        } else {
            self.seed_file.as_deref()
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// One entry of the seed file
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SeedStudent {
    pub id: String,
    pub full_name: String,
    pub stage: String,
    pub grade_code: String,
    pub stream_section: String,
    #[serde(default)]
    pub status: Option<StudentStatus>,
}

impl SeedStudent {
    pub fn into_student(self) -> Result<Student> {
        let key = PlacementKey::new(
            GradeCode::new(self.grade_code)?,
            StreamSection::new(self.stream_section)?,
        );
        let mut student = Student::admit(StudentId::new(self.id)?, self.full_name, self.stage, key);
        if let Some(status) = self.status {
            student.status = status;
        }
        Ok(student)
    }
}

pub fn load_seed(path: &str) -> Result<Vec<Student>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read seed file: {}", path))?;
    let entries: Vec<SeedStudent> =
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path))?;
    entries.into_iter().map(SeedStudent::into_student).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: placement.log
use_json: false
rotation: daily
jwt_secret: test-secret
gateway:
  host: 127.0.0.1
  port: 8080
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert!(config.postgres_url.is_none());
        assert_eq!(config.placement.batch_concurrency, 8);
        assert!(matches!(config.placement.grade_catalog(), GradeCatalog::Lenient));
        assert_eq!(
            config.placement.guard_config().lock_timeout,
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_strict_grade_codes() {
        let yaml = format!(
            "{}placement:\n  lock_timeout_ms: 100\n  max_conflict_retries: 1\n  batch_concurrency: 2\n  audit_queue_size: 16\n  grade_codes: [JSS1, JSS2]\n",
            MINIMAL
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        let catalog = config.placement.grade_catalog();
        assert!(catalog.parse("JSS1").is_ok());
        assert!(catalog.parse("SS3").is_err());
    }

    #[test]
    fn test_seed_file_only_for_memory_store() {
        let placement = PlacementConfig {
            seed_file: Some("config/students.yaml".into()),
            ..PlacementConfig::default()
        };
        assert_eq!(placement.seed_file_for(false), Some("config/students.yaml"));
        assert_eq!(placement.seed_file_for(true), None);
        assert_eq!(PlacementConfig::default().seed_file_for(false), None);
    }

    #[test]
    fn test_seed_entry_into_student() {
        let yaml = r#"
- id: STU-001
  fullName: Ada Obi
  stage: Junior Secondary
  gradeCode: JSS1
  streamSection: A
- id: STU-002
  fullName: Chidi Eze
  stage: Senior Secondary
  gradeCode: SS3
  streamSection: Science
  status: suspended
"#;
        let entries: Vec<SeedStudent> = serde_yaml::from_str(yaml).unwrap();
        let students: Vec<Student> = entries
            .into_iter()
            .map(|e| e.into_student().unwrap())
            .collect();
        assert_eq!(students[0].status, StudentStatus::Active);
        assert_eq!(students[1].status, StudentStatus::Suspended);
        assert_eq!(students[1].stream_section.as_str(), "Science");
    }

    #[test]
    fn test_seed_entry_rejects_blank_id() {
        let entry = SeedStudent {
            id: " ".into(),
            full_name: "X".into(),
            stage: "Primary".into(),
            grade_code: "PRY1".into(),
            stream_section: "A".into(),
            status: None,
        };
        assert!(entry.into_student().is_err());
    }
}
