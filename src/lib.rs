//! `indicium` library crate.
//!
//! The binary (`indicium`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the provider and derived views are reusable from other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod domain;
pub mod error;
pub mod filters;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tui;
