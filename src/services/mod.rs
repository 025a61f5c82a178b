//! Orchestration Services
//!
//! The staleness/retry machinery and the facade service built on it.

pub mod epoch;
pub mod progress;
pub mod retry;
pub mod studio;
