//! Shared plumbing for slotbook binaries: tracing setup and env config helpers.

pub mod config;
pub mod tracing;
