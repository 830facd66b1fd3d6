//! Document intelligence for SEND casework: statutory compliance checks,
//! risk assessment, and quality scoring over case documents.
//!
//! The analysis core lives in [`workflows::analysis`]; [`workflows::register`]
//! imports documents from case-register CSV exports. The `config`, `error`,
//! and `telemetry` modules carry the service plumbing shared with the HTTP
//! binary.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
