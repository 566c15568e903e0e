//! Gateway runtime: the conversation dispatcher, the batch engine and the
//! cached tutor service, plus the pieces they share (command classification,
//! reply rendering, inbound parsing, notification rendering).

pub mod batch;
pub mod command;
pub mod dispatcher;
pub mod inbound;
pub mod notify;
pub mod replies;
pub mod tutor;

pub use batch::{BatchReport, ChunkPlan, MessageSpec, Recipient};
pub use command::Command;
pub use dispatcher::{Dispatcher, DispatcherSettings, Outcome};
pub use inbound::{InboundContent, InboundMessage};
pub use tutor::TutorService;
