//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `RecurrenceEngine`, which runs one guarded payment
//! attempt per delivered trigger, and the dispatcher loop that feeds it.

pub mod dispatcher;
pub mod engine;
