pub mod booking;
pub mod feedback;
pub mod listing;
pub mod profile;
pub mod stats;

#[cfg(test)]
pub(crate) mod fakes;
