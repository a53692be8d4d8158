//! Simulated election figures.
//!
//! The baselines are the 2022 presidential figures, used as a plausibility
//! anchor for the dashboard when no real source answers. They are
//! illustrative placeholders, not verified electoral data.

use rand::Rng;

use crate::domain::{DataSource, ElectionStats, ParticipationHistory, ParticipationHistoryPoint};

pub const BASE_PARTICIPATION: f64 = 67.1;
pub const BASE_ABSTENTION: f64 = 32.9;
pub const BASE_BLANCS_NULS: f64 = 2.8;
pub const BASE_TOTAL_VOTANTS: u64 = 35_000_000;

/// Full width of the multiplicative "live" variation (±1%).
pub const LIVE_VARIATION: f64 = 0.02;

/// Amplitude of the response-derived history variation (±0.5%).
pub const HISTORY_VARIATION: f64 = 0.005;

/// Past presidential participation rates, oldest first.
pub const HISTORY_BASELINE: [(&str, f64); 5] = [
    ("2002", 71.6),
    ("2007", 83.8),
    ("2012", 79.5),
    ("2017", 74.6),
    ("2022", 72.0),
];

/// Fixed baseline record, no I/O and no randomness.
///
/// Suitable for a first render before the async fetch resolves.
pub fn mock_stats() -> ElectionStats {
    ElectionStats {
        participation: BASE_PARTICIPATION,
        abstention: BASE_ABSTENTION,
        blancs_nuls: BASE_BLANCS_NULS,
        total_votants: BASE_TOTAL_VOTANTS,
        data_source: DataSource::Simulated,
    }
}

/// Alternative "recent" placeholder figures.
pub fn recent_mock_stats() -> ElectionStats {
    ElectionStats {
        participation: 72.3,
        abstention: 27.7,
        blancs_nuls: 3.1,
        total_votants: 38_000_000,
        data_source: DataSource::Simulated,
    }
}

/// Baseline perturbed by one uniform factor in `[0.99, 1.01]` applied to every field.
pub fn simulated_stats<R: Rng>(rng: &mut R) -> ElectionStats {
    let factor = 1.0 + (rng.r#gen::<f64>() - 0.5) * LIVE_VARIATION;
    ElectionStats {
        participation: round1(BASE_PARTICIPATION * factor),
        abstention: round1(BASE_ABSTENTION * factor),
        blancs_nuls: round1(BASE_BLANCS_NULS * factor),
        total_votants: (BASE_TOTAL_VOTANTS as f64 * factor).round() as u64,
        data_source: DataSource::Simulated,
    }
}

/// Unperturbed history series, tagged simulated.
pub fn mock_participation_history() -> ParticipationHistory {
    ParticipationHistory {
        points: scaled_history(1.0),
        data_source: DataSource::Simulated,
    }
}

/// History series after a reachable source answered.
///
/// The variation is a pure function of the response's `id` (1 when absent),
/// so the same response always yields the same series.
pub fn history_from_response(response_id: Option<f64>) -> ParticipationHistory {
    let id = response_id.filter(|v| v.is_finite()).unwrap_or(1.0);
    let factor = 1.0 + id.sin() * HISTORY_VARIATION;
    ParticipationHistory {
        points: scaled_history(factor),
        data_source: DataSource::Real,
    }
}

fn scaled_history(factor: f64) -> Vec<ParticipationHistoryPoint> {
    HISTORY_BASELINE
        .iter()
        .map(|&(year, participation)| ParticipationHistoryPoint {
            year: year.to_string(),
            participation: round1(participation * factor),
        })
        .collect()
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn within(value: f64, base: f64, rel: f64) -> bool {
        (value - base).abs() <= base * rel + 1e-9
    }

    #[test]
    fn simulated_stats_stay_in_envelope() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..1000 {
            let s = simulated_stats(&mut rng);
            assert_eq!(s.data_source, DataSource::Simulated);
            assert!(within(s.participation, BASE_PARTICIPATION, 0.02), "{s:?}");
            assert!(within(s.abstention, BASE_ABSTENTION, 0.02), "{s:?}");
            assert!(within(s.blancs_nuls, BASE_BLANCS_NULS, 0.02 + 0.05 / BASE_BLANCS_NULS), "{s:?}");
            assert!(within(s.total_votants as f64, BASE_TOTAL_VOTANTS as f64, 0.02), "{s:?}");
            assert!((65.77..=68.43).contains(&s.participation));
        }
    }

    #[test]
    fn unseeded_calls_vary_within_envelope() {
        let mut rng = rand::thread_rng();
        let a = simulated_stats(&mut rng);
        let b = simulated_stats(&mut rng);
        for s in [a, b] {
            assert!(within(s.participation, BASE_PARTICIPATION, 0.02));
            assert!(within(s.total_votants as f64, BASE_TOTAL_VOTANTS as f64, 0.02));
        }
    }

    #[test]
    fn same_seed_same_record() {
        let a = simulated_stats(&mut StdRng::seed_from_u64(42));
        let b = simulated_stats(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_accessors() {
        let base = mock_stats();
        assert_eq!(base.participation, 67.1);
        assert_eq!(base.total_votants, 35_000_000);
        assert_eq!(recent_mock_stats().participation, 72.3);

        let history = mock_participation_history();
        assert_eq!(history.data_source, DataSource::Simulated);
        let years: Vec<&str> = history.points.iter().map(|p| p.year.as_str()).collect();
        assert_eq!(years, ["2002", "2007", "2012", "2017", "2022"]);
        assert_eq!(history.points[1].participation, 83.8);
    }

    #[test]
    fn history_variation_is_reproducible_and_tiny() {
        let a = history_from_response(Some(3.0));
        let b = history_from_response(Some(3.0));
        assert_eq!(a, b);
        assert_eq!(a.data_source, DataSource::Real);

        // sin(1) * 0.005 ≈ +0.42%: 83.8 -> 84.2
        let default_id = history_from_response(None);
        assert_eq!(default_id.points[1].participation, 84.2);

        for (p, (_, base)) in a.points.iter().zip(HISTORY_BASELINE) {
            assert!(within(p.participation, base, HISTORY_VARIATION + 0.001));
        }
    }
}
