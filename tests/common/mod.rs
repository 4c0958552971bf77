#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use slateworks::config::EngineConfig;
use slateworks::modules::audit::model::ActorContext;
use slateworks::modules::audit::service::InMemoryAuditSink;
use slateworks::modules::eligibility::service::{AllClear, ClearanceProvider};
use slateworks::modules::schools::model::SchoolProfile;
use slateworks::modules::students::model::{NewStudent, Student};
use slateworks::state::Engine;
use slateworks::store::InMemoryStudentStore;

pub struct TestHarness {
    pub store: Arc<InMemoryStudentStore>,
    pub audit: Arc<InMemoryAuditSink>,
    pub engine: Engine,
    pub school: SchoolProfile,
}

pub async fn harness() -> TestHarness {
    harness_with_clearance(Arc::new(AllClear)).await
}

pub async fn harness_with_clearance(clearance: Arc<dyn ClearanceProvider>) -> TestHarness {
    let store = Arc::new(InMemoryStudentStore::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let school = SchoolProfile {
        id: Uuid::new_v4(),
        name: "Greenhill High".to_string(),
        code: "GHS".to_string(),
        terminal_grade: "Final".to_string(),
    };
    store.put_school(school.clone()).await;
    let engine = Engine::new(
        store.clone(),
        audit.clone(),
        clearance,
        EngineConfig::default(),
    );
    TestHarness {
        store,
        audit,
        engine,
        school,
    }
}

pub fn actor() -> ActorContext {
    ActorContext {
        actor_id: Uuid::new_v4(),
        actor_name: "Registrar".to_string(),
        actor_role: "admin".to_string(),
    }
}

/// An active student in the terminal grade who passes every graduation
/// rule.
pub fn eligible_senior(school_id: Uuid, number: &str, email: &str) -> Student {
    let mut student = Student::new(
        school_id,
        number.to_string(),
        NewStudent {
            first_name: "Ama".to_string(),
            last_name: "Boateng".to_string(),
            email: email.to_string(),
            grade_code: "Final".to_string(),
            stream_section: Some("A".to_string()),
            date_of_birth: None,
            guardian_contact: None,
            gpa: Some(3.2),
            total_credits: Some(160),
            admission_number: None,
        },
    );
    student.financial.outstanding_balance = Decimal::ZERO;
    student
}

/// An active student in a non-terminal grade.
pub fn junior(school_id: Uuid, grade: &str, number: &str, email: &str) -> Student {
    Student::new(
        school_id,
        number.to_string(),
        NewStudent {
            first_name: "Kwame".to_string(),
            last_name: "Asante".to_string(),
            email: email.to_string(),
            grade_code: grade.to_string(),
            stream_section: Some("A".to_string()),
            date_of_birth: None,
            guardian_contact: None,
            gpa: Some(2.8),
            total_credits: Some(90),
            admission_number: None,
        },
    )
}
