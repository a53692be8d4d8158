//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed from the data provider to any front-end (CLI, TUI, report export)
//! - printed as JSON for scripting
//! - compared in tests without pulling in I/O

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where an `ElectionStats` record came from.
///
/// Always set by the code path that produced the record, never inferred later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataSource {
    Real,
    Simulated,
}

impl DataSource {
    /// Short label shown next to every widget fed by the provider.
    pub fn label(self) -> &'static str {
        match self {
            DataSource::Real => "API officielle",
            DataSource::Simulated => "Données simulées",
        }
    }

    /// Advisory banner text. Simulated data is a notice, not an error.
    pub fn banner(self) -> &'static str {
        match self {
            DataSource::Real => "API officielle - Données officielles en temps réel",
            DataSource::Simulated => {
                "Données simulées - Les APIs officielles sont temporairement indisponibles"
            }
        }
    }
}

/// National-level election statistics, as rendered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionStats {
    /// Percentage of registered voters who voted.
    pub participation: f64,
    /// Percentage of registered voters counted as abstaining.
    ///
    /// Computed from counted abstentions, so it need not equal `100 - participation`.
    pub abstention: f64,
    /// Blank + spoiled ballots as a percentage of votes cast.
    pub blancs_nuls: f64,
    pub total_votants: u64,
    pub data_source: DataSource,
}

/// One precinct/commune row of a results table.
///
/// Wire values are text; anything missing or unparsable becomes 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawElectionRow {
    pub inscrits: u64,
    pub votants: u64,
    pub blancs: u64,
    pub nuls: u64,
    pub abstentions: u64,
}

/// Column sums over every row of one fetched dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateTotals {
    pub inscrits: u64,
    pub votants: u64,
    pub blancs: u64,
    pub nuls: u64,
    pub abstentions: u64,
    /// Rows seen (including rows that contributed zeros).
    pub rows: usize,
}

impl AggregateTotals {
    pub fn add(&mut self, row: &RawElectionRow) {
        self.inscrits = self.inscrits.saturating_add(row.inscrits);
        self.votants = self.votants.saturating_add(row.votants);
        self.blancs = self.blancs.saturating_add(row.blancs);
        self.nuls = self.nuls.saturating_add(row.nuls);
        self.abstentions = self.abstentions.saturating_add(row.abstentions);
        self.rows += 1;
    }

    /// Zero inscrits or zero votants means the payload was empty or garbage.
    pub fn is_valid(&self) -> bool {
        self.inscrits > 0 && self.votants > 0
    }

    /// Derive rates from the totals. Returns `None` for an invalid aggregate
    /// rather than dividing by zero.
    pub fn to_stats(&self) -> Option<ElectionStats> {
        if !self.is_valid() {
            return None;
        }
        let inscrits = self.inscrits as f64;
        let votants = self.votants as f64;
        Some(ElectionStats {
            participation: votants / inscrits * 100.0,
            abstention: self.abstentions as f64 / inscrits * 100.0,
            blancs_nuls: self.blancs.saturating_add(self.nuls) as f64 / votants * 100.0,
            total_votants: self.votants,
            data_source: DataSource::Real,
        })
    }
}

/// One point of the participation trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationHistoryPoint {
    pub year: String,
    pub participation: f64,
}

/// Participation trend, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationHistory {
    pub points: Vec<ParticipationHistoryPoint>,
    pub data_source: DataSource,
}

/// Presidential election years offered by the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum ElectionYear {
    #[serde(rename = "2022")]
    #[value(name = "2022")]
    Y2022,
    #[serde(rename = "2017")]
    #[value(name = "2017")]
    Y2017,
    #[serde(rename = "2012")]
    #[value(name = "2012")]
    Y2012,
    #[serde(rename = "2007")]
    #[value(name = "2007")]
    Y2007,
}

impl ElectionYear {
    /// Display order of the filter panel (most recent first).
    pub const ALL: [ElectionYear; 4] = [
        ElectionYear::Y2022,
        ElectionYear::Y2017,
        ElectionYear::Y2012,
        ElectionYear::Y2007,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElectionYear::Y2022 => "2022",
            ElectionYear::Y2017 => "2017",
            ElectionYear::Y2012 => "2012",
            ElectionYear::Y2007 => "2007",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|y| *y == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|y| *y == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ElectionYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Election round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Round {
    #[serde(rename = "1")]
    #[value(name = "1")]
    First,
    #[serde(rename = "2")]
    #[value(name = "2")]
    Second,
}

impl Round {
    pub fn as_str(self) -> &'static str {
        match self {
            Round::First => "1",
            Round::Second => "2",
        }
    }

    /// French label used in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Round::First => "Premier tour",
            Round::Second => "Deuxième tour",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Round::First => Round::Second,
            Round::Second => Round::First,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The year/round selection driving every dashboard widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filters {
    pub year: ElectionYear,
    pub round: Round,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            year: ElectionYear::Y2022,
            round: Round::Second,
        }
    }
}

/// One KPI card (title + preformatted value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kpi {
    pub title: String,
    pub value: String,
}

/// A candidate's result in the duel view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub name: String,
    pub votes: u64,
    pub percent: f64,
}

/// Estimated results for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    pub name: String,
    pub macron: u64,
    pub lepen: u64,
    pub winner: String,
    pub participation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_rates_are_independent() {
        let mut totals = AggregateTotals::default();
        totals.add(&RawElectionRow {
            inscrits: 200,
            votants: 150,
            blancs: 3,
            nuls: 2,
            abstentions: 40,
        });
        let stats = totals.to_stats().unwrap();
        assert!((stats.participation - 75.0).abs() < 1e-9);
        // 40/200, not 100 - 75.
        assert!((stats.abstention - 20.0).abs() < 1e-9);
        assert!((stats.blancs_nuls - 5.0 / 150.0 * 100.0).abs() < 1e-9);
        assert_eq!(stats.total_votants, 150);
        assert_eq!(stats.data_source, DataSource::Real);
    }

    #[test]
    fn zero_aggregate_has_no_stats() {
        assert!(AggregateTotals::default().to_stats().is_none());

        let mut no_votes = AggregateTotals::default();
        no_votes.add(&RawElectionRow {
            inscrits: 10,
            ..RawElectionRow::default()
        });
        assert!(!no_votes.is_valid());
        assert!(no_votes.to_stats().is_none());
    }

    #[test]
    fn year_cycles_wrap_around() {
        assert_eq!(ElectionYear::Y2007.next(), ElectionYear::Y2022);
        assert_eq!(ElectionYear::Y2022.prev(), ElectionYear::Y2007);
        assert_eq!(Round::First.toggle(), Round::Second);
    }

    #[test]
    fn stats_serialize_with_dashboard_field_names() {
        let stats = ElectionStats {
            participation: 70.0,
            abstention: 30.0,
            blancs_nuls: 4.0,
            total_votants: 70,
            data_source: DataSource::Simulated,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"blancsNuls\":4.0"));
        assert!(json.contains("\"totalVotants\":70"));
        assert!(json.contains("\"dataSource\":\"SIMULATED\""));
    }
}
