//! Views derived from the provider's national figures.
//!
//! Candidate and regional numbers are estimates computed from the national
//! stats (there is no per-candidate or per-region source); they inherit the
//! provenance tag of the stats they were derived from.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::data::ElectionProvider;
use crate::data::mock::round1;
use crate::domain::{
    CandidateResult, DataSource, ElectionStats, Filters, Kpi, ParticipationHistory, RegionResult,
};

/// Share of votes cast that are expressed (neither blank nor spoiled).
pub const EXPRESSED_SHARE: f64 = 0.972;

const MACRON: &str = "Emmanuel Macron";
const LEPEN: &str = "Marine Le Pen";
const BASE_MACRON_PERCENT: f64 = 58.55;
const BASE_LEPEN_PERCENT: f64 = 41.45;

/// Approximate population share per metropolitan region.
pub const REGION_SHARES: [(&str, f64); 13] = [
    ("Auvergne-Rhône-Alpes", 0.12),
    ("Bourgogne-Franche-Comté", 0.04),
    ("Bretagne", 0.05),
    ("Centre-Val de Loire", 0.04),
    ("Corse", 0.01),
    ("Grand Est", 0.08),
    ("Hauts-de-France", 0.09),
    ("Île-de-France", 0.18),
    ("Normandie", 0.05),
    ("Nouvelle-Aquitaine", 0.09),
    ("Occitanie", 0.09),
    ("Pays de la Loire", 0.06),
    ("Provence-Alpes-Côte d'Azur", 0.08),
];

/// Everything one dashboard screen shows for a filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub filters: Filters,
    pub stats: ElectionStats,
    pub history: ParticipationHistory,
    pub kpis: Vec<Kpi>,
    pub candidates: Vec<CandidateResult>,
    pub regions: Vec<RegionResult>,
}

impl DashboardData {
    /// Query the provider and derive every view.
    pub fn load(provider: &ElectionProvider, filters: Filters) -> Self {
        let stats = provider.fetch_election_data(filters);
        let history = provider.fetch_participation_history(filters);
        Self::from_parts(filters, stats, history)
    }

    pub fn from_parts(filters: Filters, stats: ElectionStats, history: ParticipationHistory) -> Self {
        Self {
            filters,
            kpis: kpis(&stats),
            candidates: candidate_results(&stats),
            regions: region_results(&stats, filters),
            stats,
            history,
        }
    }

    /// Immediate placeholder screen: fixed mock figures and published
    /// results, no I/O.
    pub fn placeholder(filters: Filters) -> Self {
        let stats = crate::data::mock_stats();
        Self {
            filters,
            kpis: kpis(&stats),
            candidates: fallback_candidates(),
            regions: fallback_regions(),
            stats,
            history: crate::data::mock_participation_history(),
        }
    }
}

/// The four headline cards.
pub fn kpis(stats: &ElectionStats) -> Vec<Kpi> {
    vec![
        Kpi {
            title: "Taux de participation".to_string(),
            value: format_percent(stats.participation),
        },
        Kpi {
            title: "Taux d'abstention".to_string(),
            value: format_percent(stats.abstention),
        },
        Kpi {
            title: "Votes blancs / nuls".to_string(),
            value: format_percent(stats.blancs_nuls),
        },
        Kpi {
            title: "Nombre de votants".to_string(),
            value: format_fr_integer(stats.total_votants),
        },
    ]
}

pub fn format_percent(v: f64) -> String {
    format!("{v:.1} %")
}

/// Group digits by three with a narrow no-break space, as `fr-FR` does.
pub fn format_fr_integer(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('\u{202f}');
        }
        out.push(ch);
    }
    out
}

/// Second-round duel estimate.
///
/// High participation favours the incumbent and high abstention the
/// challenger; shares are renormalised to 100 and rounded to one decimal.
pub fn candidate_results(stats: &ElectionStats) -> Vec<CandidateResult> {
    let expressed = (stats.total_votants as f64 * EXPRESSED_SHARE).round() as u64;

    let mut macron = BASE_MACRON_PERCENT;
    let mut lepen = BASE_LEPEN_PERCENT;

    let participation = stats.participation / 100.0;
    if participation > 0.75 {
        macron += 2.0;
        lepen -= 2.0;
    } else if participation < 0.65 {
        macron -= 3.0;
        lepen += 3.0;
    }

    if stats.abstention > 35.0 {
        macron -= 1.5;
        lepen += 1.5;
    } else if stats.abstention < 25.0 {
        macron += 1.5;
        lepen -= 1.5;
    }

    let total = macron + lepen;
    let macron_percent = round1(macron / total * 100.0);
    let lepen_percent = round1(lepen / total * 100.0);

    let macron_votes = (expressed as f64 * macron_percent / 100.0).round() as u64;
    let lepen_votes = expressed.saturating_sub(macron_votes);

    vec![
        CandidateResult {
            name: MACRON.to_string(),
            votes: macron_votes,
            percent: macron_percent,
        },
        CandidateResult {
            name: LEPEN.to_string(),
            votes: lepen_votes,
            percent: lepen_percent,
        },
    ]
}

/// Published 2022 second-round results, used when no stats are available.
pub fn fallback_candidates() -> Vec<CandidateResult> {
    vec![
        CandidateResult {
            name: MACRON.to_string(),
            votes: 18_760_444,
            percent: BASE_MACRON_PERCENT,
        },
        CandidateResult {
            name: LEPEN.to_string(),
            votes: 13_286_006,
            percent: BASE_LEPEN_PERCENT,
        },
    ]
}

/// Per-region estimate spread from the national figures.
///
/// Regional participation varies ±5% and each candidate's share ±8% around
/// the national result. The draw is seeded from the selection and the stats,
/// so the same screen always shows the same map.
pub fn region_results(stats: &ElectionStats, filters: Filters) -> Vec<RegionResult> {
    let mut rng = StdRng::seed_from_u64(region_seed(stats, filters));

    REGION_SHARES
        .iter()
        .map(|&(name, share)| {
            let votants = stats.total_votants as f64 * share;
            let participation = round1(stats.participation * rng.gen_range(0.95..=1.05));
            // Votes cast scale with the local turnout relative to the national one.
            let turnout_ratio = if stats.participation > 0.0 {
                participation / stats.participation
            } else {
                1.0
            };
            let expressed = (votants * turnout_ratio * EXPRESSED_SHARE).round() as u64;

            let macron = round1(BASE_MACRON_PERCENT * rng.gen_range(0.92..=1.08));
            let lepen = round1(BASE_LEPEN_PERCENT * rng.gen_range(0.92..=1.08));
            let macron_share = macron / (macron + lepen) * 100.0;

            let macron_votes = (expressed as f64 * macron_share / 100.0).round() as u64;
            let lepen_votes = expressed.saturating_sub(macron_votes);

            RegionResult {
                name: name.to_string(),
                macron: macron_votes,
                lepen: lepen_votes,
                winner: if macron_votes > lepen_votes { "Macron" } else { "Le Pen" }.to_string(),
                participation,
            }
        })
        .collect()
}

/// Two well-known regions, used when no stats are available.
pub fn fallback_regions() -> Vec<RegionResult> {
    vec![
        RegionResult {
            name: "Île-de-France".to_string(),
            macron: 4_200_000,
            lepen: 1_800_000,
            winner: "Macron".to_string(),
            participation: 78.2,
        },
        RegionResult {
            name: "Auvergne-Rhône-Alpes".to_string(),
            macron: 3_200_000,
            lepen: 2_200_000,
            winner: "Macron".to_string(),
            participation: 72.5,
        },
    ]
}

fn region_seed(stats: &ElectionStats, filters: Filters) -> u64 {
    let mut hasher = DefaultHasher::new();
    filters.hash(&mut hasher);
    stats.participation.to_bits().hash(&mut hasher);
    stats.abstention.to_bits().hash(&mut hasher);
    stats.total_votants.hash(&mut hasher);
    hasher.finish()
}

/// Whether every view on screen is backed by real data.
pub fn overall_source(data: &DashboardData) -> DataSource {
    if data.stats.data_source == DataSource::Real && data.history.data_source == DataSource::Real {
        DataSource::Real
    } else {
        DataSource::Simulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mock_stats;
    use crate::domain::{ElectionYear, Round};

    fn stats(participation: f64, abstention: f64) -> ElectionStats {
        ElectionStats {
            participation,
            abstention,
            blancs_nuls: 2.8,
            total_votants: 35_000_000,
            data_source: DataSource::Real,
        }
    }

    #[test]
    fn fr_grouping() {
        assert_eq!(format_fr_integer(0), "0");
        assert_eq!(format_fr_integer(999), "999");
        assert_eq!(format_fr_integer(1000), "1\u{202f}000");
        assert_eq!(format_fr_integer(35_000_000), "35\u{202f}000\u{202f}000");
    }

    #[test]
    fn kpi_cards() {
        let cards = kpis(&mock_stats());
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].value, "67.1 %");
        assert_eq!(cards[1].value, "32.9 %");
        assert_eq!(cards[2].value, "2.8 %");
        assert_eq!(cards[3].value, "35\u{202f}000\u{202f}000");
    }

    fn close(a: f64, b: f64) -> bool {
        // One-decimal rounding of a .x5 value may go either way.
        (a - b).abs() <= 0.05 + 1e-9
    }

    #[test]
    fn duel_baseline_is_unadjusted_in_the_middle_band() {
        let results = candidate_results(&stats(70.0, 30.0));
        assert!(close(results[0].percent, 58.55), "{results:?}");
        assert!(close(results[1].percent, 41.45), "{results:?}");
        let expressed = (35_000_000.0 * EXPRESSED_SHARE).round() as u64;
        assert_eq!(results[0].votes + results[1].votes, expressed);
    }

    #[test]
    fn duel_adjusts_for_turnout_and_abstention() {
        // High turnout and low abstention: +2 and +1.5.
        let high = candidate_results(&stats(80.0, 20.0));
        assert!(close(high[0].percent, 62.05), "{high:?}");
        // Low turnout and high abstention: -3 and -1.5.
        let low = candidate_results(&stats(60.0, 40.0));
        assert!(close(low[0].percent, 54.05), "{low:?}");
        assert!(low[1].votes < low[0].votes);
    }

    #[test]
    fn regions_are_stable_per_selection() {
        let s = stats(70.0, 30.0);
        let filters = Filters::default();
        let a = region_results(&s, filters);
        let b = region_results(&s, filters);
        assert_eq!(a, b);
        assert_eq!(a.len(), REGION_SHARES.len());

        for r in &a {
            assert!(r.participation >= 66.5 - 0.05 && r.participation <= 73.5 + 0.05, "{r:?}");
            let expected = if r.macron > r.lepen { "Macron" } else { "Le Pen" };
            assert_eq!(r.winner, expected);
        }

        let other = region_results(
            &s,
            Filters {
                year: ElectionYear::Y2007,
                round: Round::First,
            },
        );
        assert_ne!(a, other);
    }

    #[test]
    fn placeholder_is_fully_simulated() {
        let data = DashboardData::placeholder(Filters::default());
        assert_eq!(overall_source(&data), DataSource::Simulated);
        assert_eq!(data.kpis.len(), 4);
        assert_eq!(data.candidates, fallback_candidates());
        assert_eq!(data.candidates[0].votes, 18_760_444);
        assert_eq!(data.regions.len(), 2);
    }
}
