//! Conversation sessions for EduSync.
//!
//! Tracks which student each conversation is currently scoped to.  State is
//! in-process only: a restart forgets every selection and guardians simply
//! pick again.  Memory is bounded by a capacity limit and idle pruning.

pub mod lifecycle;
pub mod store;

pub use lifecycle::{spawn_pruner, IdlePolicy};
pub use store::{ConversationEntry, ConversationStore};
