pub mod model;
pub mod service;

pub use model::{ClearanceMode, ClearanceStatus, Eligibility, EligibilityPolicy};
pub use service::{
    AllClear, ClearanceProvider, ManualHolds, evaluate_graduation, evaluate_promotion,
    evaluate_transfer,
};
