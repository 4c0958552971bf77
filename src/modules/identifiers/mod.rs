pub mod service;

pub use service::AdmissionNumberGenerator;
