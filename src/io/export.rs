//! Dashboard report export (Markdown and JSON).
//!
//! The Markdown report mirrors the printable dashboard: header, KPI section,
//! applied filters, candidate table, participation history and footer.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::dashboard::{DashboardData, format_fr_integer};
use crate::error::AppError;

/// Output format of `write_report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

const MONTHS_FR: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];

/// `19 octobre 2026`
pub fn french_long_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), MONTHS_FR[date.month0() as usize], date.year())
}

/// `indicium-rapport-2022-tour-2-2026-10-19.md`
pub fn report_file_name(data: &DashboardData, date: NaiveDate, format: ReportFormat) -> String {
    format!(
        "indicium-rapport-{}-tour-{}-{}.{}",
        data.filters.year,
        data.filters.round,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Render the Markdown report body.
pub fn render_markdown(data: &DashboardData, date: NaiveDate) -> String {
    let mut out = String::new();

    out.push_str("# Indicium\n\n");
    out.push_str("## Rapport d'Analyse Électorale\n\n");
    out.push_str(&format!("_Généré le {}_\n\n", french_long_date(date)));

    out.push_str("### Indicateurs Clés\n\n");
    out.push_str(&format!("> {}\n\n", data.stats.data_source.banner()));
    out.push_str("| Indicateur | Valeur |\n| - | - |\n");
    for kpi in &data.kpis {
        out.push_str(&format!("| {} | {} |\n", kpi.title, kpi.value));
    }

    out.push_str("\n### Filtres Appliqués\n\n");
    out.push_str(&format!("- Année: {}\n", data.filters.year));
    out.push_str(&format!("- Tour: {}\n", data.filters.round.display_name()));

    out.push_str("\n### Résultats par candidat\n\n");
    out.push_str("| Candidat | Voix | % des exprimés |\n| - | - | - |\n");
    for c in &data.candidates {
        out.push_str(&format!(
            "| {} | {} | {:.1} |\n",
            c.name,
            format_fr_integer(c.votes),
            c.percent
        ));
    }

    out.push_str(&format!(
        "\n### Évolution de la participation ({})\n\n",
        data.history.data_source.label()
    ));
    out.push_str("| Année | Participation |\n| - | - |\n");
    for p in &data.history.points {
        out.push_str(&format!("| {} | {:.1} % |\n", p.year, p.participation));
    }

    out.push_str("\n---\n\n");
    out.push_str("Rapport généré automatiquement par Indicium\n\n");
    out.push_str("Données publiques - Analyse électorale française\n");

    out
}

/// Write the report into `dir` and return the created path.
pub fn write_report(
    dir: &Path,
    data: &DashboardData,
    date: NaiveDate,
    format: ReportFormat,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create report dir '{}': {e}", dir.display())))?;

    let path = dir.join(report_file_name(data, date, format));
    let body = match format {
        ReportFormat::Markdown => render_markdown(data, date),
        ReportFormat::Json => serde_json::to_string_pretty(data)
            .map_err(|e| AppError::new(4, format!("Failed to serialize report: {e}")))?,
    };

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create report '{}': {e}", path.display())))?;
    file.write_all(body.as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write report '{}': {e}", path.display())))?;

    Ok(path)
}
