//! Input/output helpers.
//!
//! - dashboard report exports (Markdown/JSON) (`export`)

pub mod export;

pub use export::*;
