//! In-memory [`StudentStore`] used by tests and embedding applications
//! that bring their own persistence later.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::modules::schools::model::SchoolProfile;
use crate::modules::students::model::{Student, StudentStatus};
use crate::modules::transfers::model::TransferRequest;

use super::{StoreError, StudentFilter, StudentStore};

#[derive(Debug, Default)]
pub struct InMemoryStudentStore {
    students: Arc<RwLock<HashMap<Uuid, Student>>>,
    schools: Arc<RwLock<HashMap<Uuid, SchoolProfile>>>,
    transfers: Arc<RwLock<HashMap<Uuid, TransferRequest>>>,
    unavailable: AtomicBool,
    write_failures: AtomicBool,
}

impl InMemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_school(&self, school: SchoolProfile) {
        self.schools.write().await.insert(school.id, school);
    }

    /// Simulate a store outage. While set, every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Simulate an outage that only affects writes; reads keep working.
    /// Useful for driving a batch past scope resolution into a mid-batch
    /// fault.
    pub fn set_write_failures(&self, fail: bool) {
        self.write_failures.store(fail, Ordering::SeqCst);
    }

    pub async fn count_students(&self) -> usize {
        self.students.read().await.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(
                "record store is offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        self.check_available()?;
        if self.write_failures.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(
                "record store rejected the write".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn matches(student: &Student, school_id: Uuid, filter: &StudentFilter) -> bool {
        student.school_id == school_id
            && filter.status.is_none_or(|s| student.status == s)
            && filter
                .grade_code
                .as_ref()
                .is_none_or(|g| &student.grade_code == g)
            && filter
                .stream_section
                .as_ref()
                .is_none_or(|s| student.stream_section.as_ref() == Some(s))
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn find_by_id(&self, school_id: Uuid, id: Uuid) -> Result<Option<Student>, StoreError> {
        self.check_available()?;
        let students = self.students.read().await;
        Ok(students
            .get(&id)
            .filter(|s| s.school_id == school_id)
            .cloned())
    }

    async fn find_by_filter(
        &self,
        school_id: Uuid,
        filter: &StudentFilter,
    ) -> Result<Vec<Student>, StoreError> {
        self.check_available()?;
        let students = self.students.read().await;
        let mut results: Vec<_> = students
            .values()
            .filter(|s| Self::matches(s, school_id, filter))
            .cloned()
            .collect();
        results.sort_by(|a, b| {
            a.admission_number
                .cmp(&b.admission_number)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(results)
    }

    async fn insert(&self, student: Student) -> Result<Student, StoreError> {
        self.check_writable()?;
        let mut students = self.students.write().await;
        for existing in students.values() {
            if existing.school_id != student.school_id {
                continue;
            }
            if existing.admission_number == student.admission_number {
                return Err(StoreError::UniqueViolation {
                    field: "admission_number".to_string(),
                });
            }
            if existing.email.eq_ignore_ascii_case(&student.email) {
                return Err(StoreError::UniqueViolation {
                    field: "email".to_string(),
                });
            }
        }
        students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn update(&self, student: Student) -> Result<Student, StoreError> {
        self.check_writable()?;
        let mut students = self.students.write().await;
        if !students.contains_key(&student.id) {
            return Err(StoreError::NotFound {
                entity: "Student".to_string(),
            });
        }
        for existing in students.values() {
            if existing.id != student.id
                && existing.school_id == student.school_id
                && existing.email.eq_ignore_ascii_case(&student.email)
            {
                return Err(StoreError::UniqueViolation {
                    field: "email".to_string(),
                });
            }
        }
        students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn max_admission_sequence(
        &self,
        school_id: Uuid,
        prefix: &str,
    ) -> Result<Option<u32>, StoreError> {
        self.check_available()?;
        let students = self.students.read().await;
        Ok(students
            .values()
            .filter(|s| s.school_id == school_id)
            .filter_map(|s| s.admission_number.strip_prefix(prefix))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max())
    }

    async fn admission_number_exists(
        &self,
        school_id: Uuid,
        admission_number: &str,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let students = self.students.read().await;
        Ok(students
            .values()
            .any(|s| s.school_id == school_id && s.admission_number == admission_number))
    }

    async fn get_school(&self, school_id: Uuid) -> Result<Option<SchoolProfile>, StoreError> {
        self.check_available()?;
        Ok(self.schools.read().await.get(&school_id).cloned())
    }

    async fn get_transfer_request(
        &self,
        id: Uuid,
    ) -> Result<Option<TransferRequest>, StoreError> {
        self.check_available()?;
        Ok(self.transfers.read().await.get(&id).cloned())
    }

    async fn save_transfer_request(&self, request: TransferRequest) -> Result<(), StoreError> {
        self.check_writable()?;
        self.transfers.write().await.insert(request.id, request);
        Ok(())
    }
}
