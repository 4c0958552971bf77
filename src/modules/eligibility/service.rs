//! Canonical eligibility rules gating lifecycle transitions.
//!
//! Every call site (single-record operations, batch sweeps) evaluates
//! through this module so the rules cannot drift between paths. All
//! evaluators are pure functions of their input.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::modules::students::model::{DisciplinaryStatus, Student, StudentStatus};
use crate::utils::errors::EngineError;

use super::model::{ClearanceStatus, Eligibility, EligibilityPolicy};

pub const REASON_NOT_FINAL_GRADE: &str = "Student must be in the final grade to graduate";
pub const REASON_NOT_ACTIVE: &str = "Only active students can graduate";
pub const REASON_ON_PROBATION: &str = "Student is on academic probation";
pub const REASON_DISCIPLINARY: &str = "Student has an unresolved disciplinary record";
pub const REASON_OUTSTANDING_BALANCE: &str = "Student has an outstanding fee balance";

/// Graduation rules, evaluated in fixed order; the first failure wins.
pub fn evaluate_graduation(
    student: &Student,
    terminal_grade: &str,
    policy: &EligibilityPolicy,
) -> Eligibility {
    if student.grade_code != terminal_grade {
        return Eligibility::ineligible(REASON_NOT_FINAL_GRADE);
    }
    if student.status != StudentStatus::Active {
        return Eligibility::ineligible(REASON_NOT_ACTIVE);
    }
    match student.academics.gpa {
        Some(gpa) if gpa >= policy.min_gpa => {}
        _ => {
            return Eligibility::ineligible(format!(
                "Student does not meet the minimum GPA requirement of {:.1}",
                policy.min_gpa
            ));
        }
    }
    match student.academics.total_credits {
        Some(credits) if credits >= policy.min_credits => {}
        _ => {
            return Eligibility::ineligible(format!(
                "Student has not earned the minimum required credits of {}",
                policy.min_credits
            ));
        }
    }
    if student.standing.on_probation {
        return Eligibility::ineligible(REASON_ON_PROBATION);
    }
    if student.standing.disciplinary_status != DisciplinaryStatus::Clear {
        return Eligibility::ineligible(REASON_DISCIPLINARY);
    }
    if student.financial.outstanding_balance > Decimal::ZERO {
        return Eligibility::ineligible(REASON_OUTSTANDING_BALANCE);
    }
    Eligibility::Eligible
}

/// Promotion gate. Repeaters (students on probation) are excluded unless
/// the caller opts them in.
pub fn evaluate_promotion(student: &Student, include_repeaters: bool) -> Eligibility {
    if student.status != StudentStatus::Active {
        return Eligibility::ineligible("Only active students can be promoted");
    }
    if student.standing.on_probation && !include_repeaters {
        return Eligibility::ineligible(
            "Student is on academic probation and repeaters were not included",
        );
    }
    Eligibility::Eligible
}

/// Transfer gate, applied when a transfer request is opened.
pub fn evaluate_transfer(student: &Student) -> Eligibility {
    if student.status != StudentStatus::Active {
        return Eligibility::ineligible("Only active students can be transferred");
    }
    if student.standing.disciplinary_status == DisciplinaryStatus::Sanctioned {
        return Eligibility::ineligible("Student is under an active disciplinary sanction");
    }
    Eligibility::Eligible
}

/// External lookup for the secondary clearance gate. Backed by real
/// clearance data, not a heuristic.
#[async_trait]
pub trait ClearanceProvider: Send + Sync {
    async fn check(&self, student_id: Uuid) -> Result<ClearanceStatus, EngineError>;
}

/// Provider that clears everyone; the default for deployments without a
/// clearance system.
#[derive(Debug, Default)]
pub struct AllClear;

#[async_trait]
impl ClearanceProvider for AllClear {
    async fn check(&self, _student_id: Uuid) -> Result<ClearanceStatus, EngineError> {
        Ok(ClearanceStatus::Cleared)
    }
}

/// Provider backed by an explicit hold list, used in tests and for
/// manually curated clearance data.
#[derive(Debug, Default)]
pub struct ManualHolds {
    holds: std::sync::RwLock<std::collections::HashMap<Uuid, Vec<String>>>,
}

impl ManualHolds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hold(&self, student_id: Uuid, department: &str) {
        self.holds
            .write()
            .expect("holds lock poisoned")
            .entry(student_id)
            .or_default()
            .push(department.to_string());
    }
}

#[async_trait]
impl ClearanceProvider for ManualHolds {
    async fn check(&self, student_id: Uuid) -> Result<ClearanceStatus, EngineError> {
        let holds = self.holds.read().expect("holds lock poisoned");
        match holds.get(&student_id) {
            Some(departments) if !departments.is_empty() => Ok(ClearanceStatus::Outstanding {
                departments: departments.clone(),
            }),
            _ => Ok(ClearanceStatus::Cleared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::students::model::NewStudent;

    fn eligible_student(terminal_grade: &str) -> Student {
        let mut student = Student::new(
            Uuid::new_v4(),
            "GHS/2026/0001".to_string(),
            NewStudent {
                first_name: "Kofi".to_string(),
                last_name: "Osei".to_string(),
                email: "kofi@example.com".to_string(),
                grade_code: terminal_grade.to_string(),
                stream_section: None,
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

    #[test]
    fn fully_qualified_student_is_eligible() {
        let student = eligible_student("Final");
        let result = evaluate_graduation(&student, "Final", &EligibilityPolicy::default());
        assert!(result.is_eligible());
    }

    #[test]
    fn each_rule_flips_the_result_with_its_own_reason() {
        let policy = EligibilityPolicy::default();
        let base = eligible_student("Final");

        let mut wrong_grade = base.clone();
        wrong_grade.grade_code = "10".to_string();
        assert_eq!(
            evaluate_graduation(&wrong_grade, "Final", &policy),
            Eligibility::ineligible(REASON_NOT_FINAL_GRADE)
        );

        let mut inactive = base.clone();
        inactive.status = StudentStatus::Suspended;
        assert_eq!(
            evaluate_graduation(&inactive, "Final", &policy),
            Eligibility::ineligible(REASON_NOT_ACTIVE)
        );

        let mut low_gpa = base.clone();
        low_gpa.academics.gpa = Some(1.9);
        let Eligibility::Ineligible { reason } = evaluate_graduation(&low_gpa, "Final", &policy)
        else {
            panic!("expected ineligible");
        };
        assert!(reason.contains("minimum GPA"));

        let mut missing_gpa = base.clone();
        missing_gpa.academics.gpa = None;
        assert!(!evaluate_graduation(&missing_gpa, "Final", &policy).is_eligible());

        let mut low_credits = base.clone();
        low_credits.academics.total_credits = Some(120);
        let Eligibility::Ineligible { reason } =
            evaluate_graduation(&low_credits, "Final", &policy)
        else {
            panic!("expected ineligible");
        };
        assert!(reason.contains("minimum required credits"));

        let mut probation = base.clone();
        probation.standing.on_probation = true;
        assert_eq!(
            evaluate_graduation(&probation, "Final", &policy),
            Eligibility::ineligible(REASON_ON_PROBATION)
        );

        let mut disciplined = base.clone();
        disciplined.standing.disciplinary_status = DisciplinaryStatus::UnderReview;
        assert_eq!(
            evaluate_graduation(&disciplined, "Final", &policy),
            Eligibility::ineligible(REASON_DISCIPLINARY)
        );

        let mut indebted = base.clone();
        indebted.financial.outstanding_balance = Decimal::new(12550, 2);
        assert_eq!(
            evaluate_graduation(&indebted, "Final", &policy),
            Eligibility::ineligible(REASON_OUTSTANDING_BALANCE)
        );
    }

    #[test]
    fn first_failing_rule_wins() {
        let policy = EligibilityPolicy::default();
        let mut student = eligible_student("10");
        student.standing.on_probation = true;
        // Grade is checked before probation.
        assert_eq!(
            evaluate_graduation(&student, "Final", &policy),
            Eligibility::ineligible(REASON_NOT_FINAL_GRADE)
        );
    }

    #[test]
    fn repeaters_are_excluded_from_promotion_by_default() {
        let mut student = eligible_student("10");
        student.standing.on_probation = true;
        assert!(!evaluate_promotion(&student, false).is_eligible());
        assert!(evaluate_promotion(&student, true).is_eligible());
    }

    #[test]
    fn zero_balance_is_not_outstanding() {
        let policy = EligibilityPolicy::default();
        let mut student = eligible_student("Final");
        student.financial.outstanding_balance = Decimal::ZERO;
        assert!(evaluate_graduation(&student, "Final", &policy).is_eligible());
    }

    #[tokio::test]
    async fn manual_holds_report_departments() {
        let provider = ManualHolds::new();
        let id = Uuid::new_v4();
        provider.add_hold(id, "library");
        provider.add_hold(id, "hostel");
        match provider.check(id).await.unwrap() {
            ClearanceStatus::Outstanding { departments } => {
                assert_eq!(departments, vec!["library", "hostel"]);
            }
            ClearanceStatus::Cleared => panic!("expected outstanding holds"),
        }
        assert_eq!(
            provider.check(Uuid::new_v4()).await.unwrap(),
            ClearanceStatus::Cleared
        );
    }
}
