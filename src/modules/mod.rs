pub mod audit;
pub mod batch;
pub mod eligibility;
pub mod identifiers;
pub mod import;
pub mod lifecycle;
pub mod schools;
pub mod students;
pub mod transfers;
