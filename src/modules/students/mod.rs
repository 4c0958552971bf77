pub mod model;
pub mod service;

pub use model::{Student, StudentStatus};
pub use service::StudentService;
