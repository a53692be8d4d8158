//! Election data acquisition.
//!
//! - endpoints and HTTP transport (`source`)
//! - payload sniffing, decoding and table aggregation (`payload`)
//! - simulated fallback figures (`mock`)
//! - the provider folding over sources (`provider`)

pub mod mock;
pub mod payload;
pub mod provider;
pub mod source;

pub use mock::{mock_participation_history, mock_stats, recent_mock_stats, simulated_stats};
pub use payload::Payload;
pub use provider::ElectionProvider;
pub use source::{HttpTransport, Source, Transport};
