use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::transfers::model::TransferRequest;

/// Lifecycle status of a student record.
///
/// Status only ever changes through the lifecycle transitions in
/// [`crate::modules::lifecycle`]; nothing else writes this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,
    Inactive,
    Graduated,
    Transferred,
    Withdrawn,
    Suspended,
}

impl StudentStatus {
    /// Terminal statuses cannot be soft-deleted or reactivated.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StudentStatus::Graduated | StudentStatus::Transferred | StudentStatus::Withdrawn
        )
    }
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudentStatus::Active => write!(f, "active"),
            StudentStatus::Inactive => write!(f, "inactive"),
            StudentStatus::Graduated => write!(f, "graduated"),
            StudentStatus::Transferred => write!(f, "transferred"),
            StudentStatus::Withdrawn => write!(f, "withdrawn"),
            StudentStatus::Suspended => write!(f, "suspended"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisciplinaryStatus {
    Clear,
    UnderReview,
    Sanctioned,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AcademicMetrics {
    pub gpa: Option<f64>,
    pub total_credits: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Standing {
    pub on_probation: bool,
    pub disciplinary_status: DisciplinaryStatus,
}

impl Default for Standing {
    fn default() -> Self {
        Self {
            on_probation: false,
            disciplinary_status: DisciplinaryStatus::Clear,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub outstanding_balance: Decimal,
}

/// One promotion event. History entries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRecord {
    pub from_grade: String,
    pub to_grade: String,
    pub performed_by: Uuid,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Internal,
    External,
}

/// One completed transfer. History entries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from_school: Uuid,
    pub to_school: Uuid,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub kind: TransferKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub school_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: StudentStatus,
    pub grade_code: String,
    pub stream_section: Option<String>,
    /// Unique within a school; immutable once assigned.
    pub admission_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub guardian_contact: Option<String>,
    pub medical_notes: Option<String>,
    pub academics: AcademicMetrics,
    pub standing: Standing,
    pub financial: FinancialSummary,
    pub promotion_history: Vec<PromotionRecord>,
    pub transfer_history: Vec<TransferRecord>,
    /// Set if and only if `status` is [`StudentStatus::Graduated`].
    pub graduation_year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Build a freshly admitted, active student.
    pub fn new(school_id: Uuid, admission_number: String, details: NewStudent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            school_id,
            first_name: details.first_name,
            last_name: details.last_name,
            email: details.email,
            status: StudentStatus::Active,
            grade_code: details.grade_code,
            stream_section: details.stream_section,
            admission_number,
            date_of_birth: details.date_of_birth,
            guardian_contact: details.guardian_contact,
            medical_notes: None,
            academics: AcademicMetrics {
                gpa: details.gpa,
                total_credits: details.total_credits,
            },
            standing: Standing::default(),
            financial: FinancialSummary::default(),
            promotion_history: Vec::new(),
            transfer_history: Vec::new(),
            graduation_year: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The graduated successor state. Graduation is not recorded in
    /// `promotion_history`; the year and status carry it.
    pub fn graduated(&self, year: i32) -> Student {
        let mut next = self.clone();
        next.status = StudentStatus::Graduated;
        next.graduation_year = Some(year);
        next.updated_at = Utc::now();
        next
    }

    /// The promoted successor state, with the promotion appended to history.
    pub fn promoted(
        &self,
        to_grade: &str,
        to_section: Option<&str>,
        performed_by: Uuid,
        reason: Option<String>,
    ) -> Student {
        let now = Utc::now();
        let mut next = self.clone();
        next.promotion_history.push(PromotionRecord {
            from_grade: self.grade_code.clone(),
            to_grade: to_grade.to_string(),
            performed_by,
            timestamp: now,
            reason,
        });
        next.grade_code = to_grade.to_string();
        if let Some(section) = to_section {
            next.stream_section = Some(section.to_string());
        }
        next.updated_at = now;
        next
    }

    /// The successor state after a completed transfer. External transfers
    /// close the record here; internal ones move it and keep it active.
    pub fn transferred(&self, request: &TransferRequest) -> Student {
        let now = Utc::now();
        let mut next = self.clone();
        next.transfer_history.push(TransferRecord {
            from_school: request.from_school,
            to_school: request.to_school,
            reason: request.reason.clone(),
            timestamp: now,
            kind: request.kind,
        });
        match request.kind {
            TransferKind::External => {
                next.status = StudentStatus::Transferred;
            }
            TransferKind::Internal => {
                next.school_id = request.to_school;
            }
        }
        next.grade_code = request.to_grade.clone();
        next.stream_section = request.to_section.clone();
        next.updated_at = now;
        next
    }

    /// The soft-deleted successor state.
    pub fn deactivated(&self) -> Student {
        let mut next = self.clone();
        next.status = StudentStatus::Inactive;
        next.updated_at = Utc::now();
        next
    }
}

/// Field bundle for admitting a student, shared by the single-record
/// create path and the import pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub grade_code: String,
    pub stream_section: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub guardian_contact: Option<String>,
    pub gpa: Option<f64>,
    pub total_credits: Option<i32>,
    /// Caller-supplied admission number; generated when absent.
    pub admission_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 20))]
    pub grade_code: String,
    pub stream_section: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub guardian_contact: Option<String>,
    pub admission_number: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub stream_section: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub guardian_contact: Option<String>,
    pub medical_notes: Option<String>,
    pub gpa: Option<f64>,
    pub total_credits: Option<i32>,
    pub outstanding_balance: Option<Decimal>,
    pub on_probation: Option<bool>,
    pub disciplinary_status: Option<DisciplinaryStatus>,
}
