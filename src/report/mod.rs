//! Reporting utilities: formatted terminal output for the dashboard views.

pub mod format;

pub use format::*;
