//! The lifecycle state machine.
//!
//! Guards live here; the successor states themselves are produced by the
//! pure transformation methods on [`Student`]. Nothing is persisted at
//! this layer, so a rejected transition can never leave partial state:
//! callers save the returned student or nothing at all.

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::modules::eligibility::model::{ClearanceMode, ClearanceStatus, EligibilityPolicy};
use crate::modules::eligibility::service::{
    ClearanceProvider, evaluate_graduation, evaluate_promotion,
};
use crate::modules::schools::model::SchoolProfile;
use crate::modules::students::model::{Student, StudentStatus};
use crate::modules::transfers::model::{TransferRequest, TransferStatus};
use crate::utils::errors::EngineError;

/// A graduation that passed its guards, plus whether the secondary
/// clearance gate was waived rather than checked.
#[derive(Debug)]
pub struct GraduationOutcome {
    pub student: Student,
    pub clearance_waived: bool,
}

pub struct LifecycleService {
    clearance: Arc<dyn ClearanceProvider>,
    policy: EligibilityPolicy,
}

impl LifecycleService {
    pub fn new(clearance: Arc<dyn ClearanceProvider>, policy: EligibilityPolicy) -> Self {
        Self { clearance, policy }
    }

    /// Active → Graduated.
    ///
    /// Core eligibility always applies. The secondary clearance gate is
    /// consulted only in [`ClearanceMode::Cleared`]; `Pending` waives it
    /// even if the student would not pass it, and the waiver is reported
    /// to the caller for the audit trail.
    #[instrument(skip(self, student, school), fields(student_id = %student.id))]
    pub async fn graduate(
        &self,
        student: &Student,
        school: &SchoolProfile,
        mode: ClearanceMode,
        year: i32,
    ) -> Result<GraduationOutcome, EngineError> {
        if student.status == StudentStatus::Graduated {
            return Err(EngineError::InvalidTransition(
                "Student is already graduated".to_string(),
            ));
        }
        evaluate_graduation(student, &school.terminal_grade, &self.policy).into_result()?;

        let clearance_waived = match mode {
            ClearanceMode::Cleared => {
                match self.clearance.check(student.id).await? {
                    ClearanceStatus::Cleared => {}
                    ClearanceStatus::Outstanding { departments } => {
                        return Err(EngineError::Ineligible(format!(
                            "Student has pending clearance obligations: {}",
                            departments.join(", ")
                        )));
                    }
                }
                false
            }
            ClearanceMode::Pending => true,
        };

        Ok(GraduationOutcome {
            student: student.graduated(year),
            clearance_waived,
        })
    }

    /// Active → Active with a new grade. Appends to promotion history.
    #[instrument(skip(self, student), fields(student_id = %student.id))]
    pub fn promote(
        &self,
        student: &Student,
        target_grade: &str,
        target_section: Option<&str>,
        include_repeaters: bool,
        performed_by: Uuid,
        reason: Option<String>,
    ) -> Result<Student, EngineError> {
        if student.grade_code == target_grade {
            return Err(EngineError::InvalidTransition(format!(
                "Student is already in grade {target_grade}"
            )));
        }
        evaluate_promotion(student, include_repeaters).into_result()?;
        Ok(student.promoted(target_grade, target_section, performed_by, reason))
    }

    /// Active → Transferred (external) or a school move (internal).
    /// Requires the request workflow to have reached Approved.
    #[instrument(skip(self, student, request), fields(student_id = %student.id, request_id = %request.id))]
    pub fn complete_transfer(
        &self,
        student: &Student,
        request: &TransferRequest,
    ) -> Result<Student, EngineError> {
        if request.student_id != student.id {
            return Err(EngineError::InvalidTransition(
                "Transfer request does not belong to this student".to_string(),
            ));
        }
        match request.status {
            TransferStatus::Approved => {}
            TransferStatus::Completed => {
                return Err(EngineError::InvalidTransition(
                    "Transfer request has already been completed".to_string(),
                ));
            }
            TransferStatus::Pending | TransferStatus::Rejected => {
                return Err(EngineError::InvalidTransition(
                    "Transfer request has not been approved".to_string(),
                ));
            }
        }
        if student.status != StudentStatus::Active {
            return Err(EngineError::InvalidTransition(
                "Only active students can complete a transfer".to_string(),
            ));
        }
        Ok(student.transferred(request))
    }

    /// Non-terminal → Inactive, idempotent: removing an already-inactive
    /// student is a no-op.
    pub fn deactivate(&self, student: &Student) -> Result<Student, EngineError> {
        if student.status == StudentStatus::Inactive {
            return Ok(student.clone());
        }
        if student.status.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot deactivate a {} student",
                student.status
            )));
        }
        Ok(student.deactivated())
    }

    /// Non-terminal → Inactive with an explicit reason. Unlike
    /// [`Self::deactivate`], re-deleting an inactive student is rejected.
    pub fn deactivate_with_reason(
        &self,
        student: &Student,
        _reason: &str,
    ) -> Result<Student, EngineError> {
        if student.status == StudentStatus::Inactive {
            return Err(EngineError::InvalidTransition(
                "Student has already been deactivated".to_string(),
            ));
        }
        self.deactivate(student)
    }
}
