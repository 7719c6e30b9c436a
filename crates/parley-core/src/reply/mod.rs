//! Automated reply orchestration.
//!
//! Composes the response cache, persona responder, bot selector, and loop
//! guard behind [`orchestrator::MessageOrchestrator`], which runs on every
//! incoming human message and schedules zero or more delayed replies.

pub mod cache;
pub mod clock;
pub mod loop_guard;
pub mod orchestrator;
pub mod responder;
pub mod scheduler;
pub mod selector;
