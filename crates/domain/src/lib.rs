//! Shared types for the EduSync notification backend: the error type,
//! structured trace events, the configuration tree, phone-identity helpers
//! and the student/tenant records every other crate passes around.

pub mod config;
pub mod error;
pub mod phone;
pub mod student;
pub mod trace;

pub use error::{Error, Result};
pub use student::StudentRecord;
