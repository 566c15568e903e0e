//! EduSync gateway: the HTTP surface, the conversation dispatcher and the
//! batch engine, wired over the directory, cache, sessions, messaging and
//! answer-provider crates.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;
