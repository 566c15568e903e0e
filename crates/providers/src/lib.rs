//! Generative answer backends for the AI tutor.

pub mod google;
pub mod traits;
pub mod util;

pub use google::GeminiTutor;
pub use traits::AnswerBackend;
