//! Application state container and its synchronization with the identity
//! service, local storage and the remote profile.

pub mod store;
pub mod sync;

pub use store::{Action, AppState, Store};
pub use sync::StateSync;
