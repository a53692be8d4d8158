//! Terminal formatting for the dashboard views.
//!
//! We keep formatting code in one place so:
//! - the provider and derivation code stay free of presentation concerns
//! - output changes are localized (important for future snapshot tests)

use crate::dashboard::{DashboardData, format_fr_integer};
use crate::domain::{CandidateResult, DataSource, ElectionStats, Filters, ParticipationHistory, RegionResult};

/// Headline block: selection, provenance banner and KPI cards.
pub fn format_stats(stats: &ElectionStats, filters: Filters) -> String {
    let mut out = String::new();

    out.push_str("=== Indicium - Présidentielle ===\n");
    out.push_str(&format!(
        "Année: {} | Tour: {}\n",
        filters.year,
        filters.round.display_name()
    ));
    out.push_str(&format_banner(stats.data_source));
    out.push('\n');

    for kpi in crate::dashboard::kpis(stats) {
        out.push_str(&format!("{:<24} {:>14}\n", kpi.title, kpi.value));
    }

    out
}

pub fn format_banner(source: DataSource) -> String {
    let marker = match source {
        DataSource::Real => "[ok]",
        DataSource::Simulated => "[!]",
    };
    format!("{marker} {}\n", source.banner())
}

/// Participation trend as a two-column table.
pub fn format_history(history: &ParticipationHistory) -> String {
    let mut out = String::new();
    out.push_str(&format!("Évolution de la participation ({})\n", history.data_source.label()));
    out.push_str(&format!("{:<6} {:>8}\n", "année", "taux"));
    out.push_str(&format!("{:-<6} {:-<8}\n", "", ""));
    for p in &history.points {
        out.push_str(&format!("{:<6} {:>8}\n", p.year, format!("{:.1} %", p.participation)));
    }
    out
}

pub fn format_candidates(candidates: &[CandidateResult]) -> String {
    let mut out = String::new();
    out.push_str("Résultats par candidat\n");
    out.push_str(&format!("{:<20} {:>14} {:>8}\n", "candidat", "voix", "%"));
    out.push_str(&format!("{:-<20} {:-<14} {:-<8}\n", "", "", ""));
    for c in candidates {
        out.push_str(&format!(
            "{:<20} {:>14} {:>8.1}\n",
            truncate(&c.name, 20),
            format_fr_integer(c.votes),
            c.percent
        ));
    }
    out
}

pub fn format_regions(regions: &[RegionResult]) -> String {
    let mut out = String::new();
    out.push_str("Résultats par région\n");
    out.push_str(
        format!(
            "{:<28} {:>12} {:>12} {:>8} {:<8}\n",
            "région", "Macron", "Le Pen", "partic.", "gagnant"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:-<28} {:-<12} {:-<12} {:-<8} {:-<8}\n", "", "", "", "", "").trim_end(),
    );
    out.push('\n');

    for r in regions {
        out.push_str(
            format!(
                "{:<28} {:>12} {:>12} {:>8.1} {:<8}\n",
                truncate(&r.name, 28),
                format_fr_integer(r.macron),
                format_fr_integer(r.lepen),
                r.participation,
                r.winner,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Everything at once, as printed by `indicium report --stdout`.
pub fn format_dashboard(data: &DashboardData) -> String {
    let mut out = format_stats(&data.stats, data.filters);
    out.push('\n');
    out.push_str(&format_candidates(&data.candidates));
    out.push('\n');
    out.push_str(&format_history(&data.history));
    out.push('\n');
    out.push_str(&format_regions(&data.regions));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{mock_participation_history, mock_stats};

    #[test]
    fn stats_block_shows_selection_and_provenance() {
        let out = format_stats(&mock_stats(), Filters::default());
        assert!(out.contains("Année: 2022 | Tour: Deuxième tour"));
        assert!(out.contains("Données simulées"));
        assert!(out.contains("67.1 %"));
        assert!(out.contains("35\u{202f}000\u{202f}000"));
    }

    #[test]
    fn history_table_lists_every_year() {
        let out = format_history(&mock_participation_history());
        for year in ["2002", "2007", "2012", "2017", "2022"] {
            assert!(out.contains(year));
        }
        assert!(out.contains("83.8 %"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("Provence-Alpes-Côte d'Azur", 10), "Provence-.");
        assert_eq!(truncate("Corse", 10), "Corse");
    }

    #[test]
    fn dashboard_sections_in_order() {
        let data = DashboardData::placeholder(Filters::default());
        let out = format_dashboard(&data);
        let kpi = out.find("Taux de participation").unwrap();
        let cand = out.find("Résultats par candidat").unwrap();
        let hist = out.find("Évolution de la participation").unwrap();
        let reg = out.find("Résultats par région").unwrap();
        assert!(kpi < cand && cand < hist && hist < reg);
    }
}
