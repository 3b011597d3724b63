//! Domain types shared by every slotbook crate.
//!
//! This crate contains only pure types with no I/O or framework dependencies.
//! Remote row shapes live in the client's `infra::rows` adapter, never here.

pub mod booking;
pub mod error;
pub mod feedback;
pub mod id;
pub mod user;
pub mod volunteer;
