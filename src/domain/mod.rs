//! Domain types used throughout the dashboard.
//!
//! This module defines:
//!
//! - provider outputs (`ElectionStats`, `ParticipationHistory`) and their provenance tag
//! - raw tabular rows and their per-fetch aggregate
//! - the year/round filter selection
//! - derived view rows (`Kpi`, `CandidateResult`, `RegionResult`)

pub mod types;

pub use types::*;
