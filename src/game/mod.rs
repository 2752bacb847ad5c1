//! Game facade over the session coordinator.
//!
//! [`GameEngine`] is what a serving layer talks to. It owns the shared catalog,
//! the vector lookup and the used-pair store, and routes every per-user
//! operation through that user's session lock.

mod engine;
mod response;
mod retry;
mod types;

#[cfg(test)]
mod tests;

pub use engine::GameEngine;
pub use response::normalize_response;
pub use types::{PlayResult, ReloadOutcome, SessionSummary, SubmitOutcome};
