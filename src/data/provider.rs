//! Election data provider: ordered endpoint fallback with a simulated last resort.
//!
//! Every query folds over the configured sources in priority order. An
//! attempt is one bounded GET plus interpretation of the payload; the first
//! attempt that succeeds wins and no later source is tried. Failures of any
//! kind are logged and absorbed, so callers always get a complete record
//! tagged with its provenance.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::data::mock::{history_from_response, mock_participation_history, simulated_stats};
use crate::data::payload::{Payload, response_id, stats_from_payload};
use crate::data::source::{HttpTransport, Source, Transport};
use crate::domain::{ElectionStats, Filters, ParticipationHistory};
use crate::error::{AppError, FetchError};

pub struct ElectionProvider {
    sources: Vec<Source>,
    timeout: Duration,
    parallel: bool,
    transport: Box<dyn Transport>,
    rng: Mutex<StdRng>,
}

impl ElectionProvider {
    /// Provider over HTTP, configured from `config`.
    pub fn new(config: &ProviderConfig) -> Result<Self, AppError> {
        let transport = HttpTransport::new()
            .map_err(|e| AppError::new(4, format!("Failed to initialize HTTP client: {e}")))?;
        let provider = Self::with_transport(config, transport);
        if !provider.sources.iter().any(Source::is_filtered) {
            debug!("no source uses {{year}}/{{round}}; the selection only labels the data");
        }
        Ok(provider)
    }

    /// Provider over an arbitrary transport (tests, alternative clients).
    pub fn with_transport(config: &ProviderConfig, transport: impl Transport + 'static) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            sources: config.sources.iter().map(Source::new).collect(),
            timeout: config.timeout,
            parallel: config.parallel,
            transport: Box::new(transport),
            rng: Mutex::new(rng),
        }
    }

    /// National statistics for the selection.
    ///
    /// Never fails: when no source yields a valid results table the record
    /// is simulated (and tagged so).
    pub fn fetch_election_data(&self, filters: Filters) -> ElectionStats {
        match self.first_success(filters, "election stats", stats_from_payload) {
            Some(stats) => stats,
            None => {
                warn!(
                    year = %filters.year,
                    round = %filters.round,
                    "all sources failed for election stats; using simulated data"
                );
                self.simulated()
            }
        }
    }

    /// Participation trend.
    ///
    /// A reachable source only proves connectivity: the series is the fixed
    /// baseline, varied deterministically by the response's `id`.
    pub fn fetch_participation_history(&self, filters: Filters) -> ParticipationHistory {
        match self.first_success(filters, "participation history", |p| Ok(response_id(p))) {
            Some(id) => history_from_response(id),
            None => {
                warn!("all sources failed for participation history; using simulated data");
                mock_participation_history()
            }
        }
    }

    /// Baseline figures with the bounded "live" variation, without any I/O.
    pub fn simulated(&self) -> ElectionStats {
        // A poisoned lock only means another thread panicked mid-draw; the
        // generator state is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        simulated_stats(&mut *rng)
    }

    fn first_success<T, F>(&self, filters: Filters, what: &str, interpret: F) -> Option<T>
    where
        T: Send,
        F: Fn(&Payload) -> Result<T, FetchError> + Sync,
    {
        let attempt = |(idx, source): (usize, &Source)| {
            let url = source.url_for(filters);
            match self.attempt(&url, &interpret) {
                Ok(value) => {
                    info!(source = idx, %url, "{what} fetched");
                    Some(value)
                }
                Err(err) => {
                    warn!(source = idx, %url, "{what} source failed: {err}");
                    None
                }
            }
        };

        if self.parallel {
            // `find_map_first` keeps list order: a later source answering
            // sooner never beats an earlier one that succeeds.
            self.sources
                .par_iter()
                .enumerate()
                .find_map_first(attempt)
        } else {
            self.sources.iter().enumerate().find_map(attempt)
        }
    }

    fn attempt<T>(
        &self,
        url: &str,
        interpret: &impl Fn(&Payload) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        debug!(%url, timeout_ms = self.timeout.as_millis() as u64, "GET");
        let payload = self.transport.get(url, self.timeout)?;
        interpret(&payload)
    }
}
