pub mod app;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod guard;
pub mod infra;
pub mod notice;
pub mod state;
pub mod usecase;
