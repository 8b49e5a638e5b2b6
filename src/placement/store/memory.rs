//! In-memory student store backed by a `DashMap`.
//!
//! Used when no PostgreSQL URL is configured and throughout the tests. The CAS
//! check and the write happen under the shard write lock of the entry, so a
//! commit is atomic with respect to every other commit on the same student.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{StudentStore, check_commit};
use crate::placement::error::PlacementError;
use crate::placement::types::{Student, StudentId};

#[derive(Default)]
pub struct InMemoryStudentStore {
    students: DashMap<StudentId, Student>,
}

impl InMemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, id: &StudentId) -> Result<Option<Student>, PlacementError> {
        Ok(self.students.get(id).map(|s| s.value().clone()))
    }

    async fn insert(&self, student: &Student) -> Result<(), PlacementError> {
        match self.students.entry(student.id.clone()) {
            Entry::Occupied(_) => Err(PlacementError::DuplicateStudent(student.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(student.clone());
                Ok(())
            }
        }
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        next: &Student,
    ) -> Result<bool, PlacementError> {
        let mut stored = self
            .students
            .get_mut(&next.id)
            .ok_or_else(|| PlacementError::StudentNotFound(next.id.clone()))?;

        if stored.version != expected_version {
            return Ok(false);
        }
        check_commit(&stored, expected_version, next)?;

        *stored = next.clone();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::types::{GradeCode, PlacementKey, StreamSection};

    fn student(id: &str) -> Student {
        Student::admit(
            StudentId::new(id).unwrap(),
            "Ada Obi",
            "Junior Secondary",
            PlacementKey::new(GradeCode::new("JSS1").unwrap(), StreamSection::new("A").unwrap()),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryStudentStore::new();
        let s = student("STU-001");
        store.insert(&s).await.unwrap();

        assert_eq!(store.get(&s.id).await.unwrap(), Some(s.clone()));
        assert_eq!(
            store.insert(&s).await,
            Err(PlacementError::DuplicateStudent(s.id.clone()))
        );
        let missing = StudentId::new("STU-404").unwrap();
        assert!(store.get(&missing).await.unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_cas_success_then_stale() {
        let store = InMemoryStudentStore::new();
        let s = student("STU-001");
        store.insert(&s).await.unwrap();

        let mut next = s.clone();
        next.stream_section = StreamSection::new("B").unwrap();
        next.version = 1;
        assert!(store.compare_and_swap(0, &next).await.unwrap());

        // Second writer that also read version 0 loses
        let mut stale = s.clone();
        stale.stream_section = StreamSection::new("C").unwrap();
        stale.version = 1;
        assert!(!store.compare_and_swap(0, &stale).await.unwrap());

        let stored = store.get(&s.id).await.unwrap().unwrap();
        assert_eq!(stored.stream_section.as_str(), "B");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_cas_unknown_student() {
        let store = InMemoryStudentStore::new();
        let mut next = student("STU-404");
        next.version = 1;
        assert!(matches!(
            store.compare_and_swap(0, &next).await,
            Err(PlacementError::StudentNotFound(_))
        ));
    }
}
