//! Payload sniffing and results-table aggregation.
//!
//! Sources answer in one of two shapes:
//!
//! - a raw delimited table whose header names `Inscrits,Votants,Blancs,Nuls,Abstentions`
//! - a JSON envelope `{ "content": "<base64>", "encoding": "base64" }` wrapping such a table
//!
//! Row-level problems never abort a dataset: an unparsable cell (or a whole
//! malformed record) contributes 0. Only the final aggregate decides whether
//! the dataset is usable.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use csv::StringRecord;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{AggregateTotals, ElectionStats, RawElectionRow};
use crate::error::FetchError;

/// A successful HTTP response body (status already checked).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub body: String,
    pub content_type: Option<String>,
}

impl Payload {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Detected payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Delimited,
}

/// Decide the payload shape from the body.
///
/// Only a JSON object can be an envelope; a declared JSON content type over
/// a body that is not an object is read as a table.
pub fn sniff(payload: &Payload) -> PayloadFormat {
    let looks_json = payload
        .body
        .trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with('{');
    if looks_json {
        return PayloadFormat::Json;
    }

    if let Some(ct) = payload.content_type.as_deref() {
        if ct.to_ascii_lowercase().contains("json") {
            debug!(content_type = ct, "JSON content type over a non-object body; parsing as a table");
        }
    }
    PayloadFormat::Delimited
}

#[derive(Debug, Deserialize)]
struct Envelope {
    content: Option<String>,
    encoding: Option<String>,
}

/// Return the table text carried by a payload, decoding a base64 envelope
/// when present.
pub fn unwrap_table(payload: &Payload) -> Result<String, FetchError> {
    match sniff(payload) {
        PayloadFormat::Delimited => Ok(payload.body.clone()),
        PayloadFormat::Json => {
            let envelope: Envelope = serde_json::from_str(payload.body.trim_start_matches('\u{feff}'))
                .map_err(|e| FetchError::Decode(format!("invalid JSON: {e}")))?;
            let content = envelope
                .content
                .ok_or_else(|| FetchError::Decode("JSON payload has no `content` field".to_string()))?;
            match envelope.encoding.as_deref() {
                None | Some("base64") => decode_base64_text(&content),
                Some(other) => Err(FetchError::Decode(format!("unsupported encoding '{other}'"))),
            }
        }
    }
}

/// Decode base64 text, ignoring the line breaks some APIs insert every 60 chars.
fn decode_base64_text(content: &str) -> Result<String, FetchError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| FetchError::Decode(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| FetchError::Decode(format!("content is not UTF-8: {e}")))
}

/// Pick the field delimiter from the header line.
///
/// French open-data exports are frequently `;`-separated. The most frequent
/// candidate wins, so a comma inside a quoted column name does not flip a
/// `;` header back to `,`.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let count = |c: char| header.matches(c).count();
    let (commas, semicolons, tabs) = (count(','), count(';'), count('\t'));

    if semicolons > commas && semicolons >= tabs {
        b';'
    } else if tabs > commas {
        b'\t'
    } else {
        b','
    }
}

/// Column positions of the counted fields.
#[derive(Debug, Clone, Copy)]
struct Columns {
    inscrits: usize,
    votants: usize,
    blancs: Option<usize>,
    nuls: Option<usize>,
    abstentions: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, FetchError> {
        let map = build_header_map(headers);
        let required = |name: &str| {
            map.get(name)
                .copied()
                .ok_or_else(|| FetchError::Parse(format!("missing column '{name}'")))
        };
        Ok(Self {
            inscrits: required("inscrits")?,
            votants: required("votants")?,
            blancs: map.get("blancs").copied(),
            nuls: map.get("nuls").copied(),
            abstentions: map.get("abstentions").copied(),
        })
    }

    fn row(&self, record: &StringRecord) -> RawElectionRow {
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(parse_count).unwrap_or(0);
        RawElectionRow {
            inscrits: cell(Some(self.inscrits)),
            votants: cell(Some(self.votants)),
            blancs: cell(self.blancs),
            nuls: cell(self.nuls),
            abstentions: cell(self.abstentions),
        }
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Parse a count cell by its leading integer part (`100.0` is 100, `12abc`
/// is 12). No leading digit, a sign other than `+`, or overflow gives 0.
pub fn parse_count(raw: &str) -> u64 {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..end].parse::<u64>().unwrap_or(0)
}

/// Parse every row of a delimited table.
pub fn parse_rows(text: &str) -> Result<Vec<RawElectionRow>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FetchError::Parse(format!("unreadable header: {e}")))?
        .clone();
    let columns = Columns::resolve(&headers)?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(columns.row(&record)),
            Err(e) => {
                // +2: 1-based lines, header on line 1.
                debug!(line = idx + 2, "malformed record counted as zeros: {e}");
                rows.push(RawElectionRow::default());
            }
        }
    }
    Ok(rows)
}

/// Sum a delimited table into totals.
pub fn aggregate(text: &str) -> Result<AggregateTotals, FetchError> {
    let mut totals = AggregateTotals::default();
    for row in parse_rows(text)? {
        totals.add(&row);
    }
    Ok(totals)
}

/// Full stats path for one payload: unwrap, parse, aggregate, validate.
pub fn stats_from_payload(payload: &Payload) -> Result<ElectionStats, FetchError> {
    let table = unwrap_table(payload)?;
    let totals = aggregate(&table)?;
    debug!(
        rows = totals.rows,
        inscrits = totals.inscrits,
        votants = totals.votants,
        blancs = totals.blancs,
        nuls = totals.nuls,
        abstentions = totals.abstentions,
        "aggregated results table"
    );
    totals.to_stats().ok_or(FetchError::InvalidAggregate {
        inscrits: totals.inscrits,
        votants: totals.votants,
    })
}

/// Numeric `id` of a JSON object payload, if any.
///
/// Used as the reproducible variation source for the history series.
pub fn response_id(payload: &Payload) -> Option<f64> {
    let value: serde_json::Value = serde_json::from_str(payload.body.trim()).ok()?;
    value.get("id")?.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataSource;

    const SCENARIO_A: &str = "Inscrits,Votants,Blancs,Nuls,Abstentions\n100,70,2,1,30";

    #[test]
    fn plain_csv_scenario() {
        let stats = stats_from_payload(&Payload::new(SCENARIO_A)).unwrap();
        assert!((stats.participation - 70.0).abs() < 1e-9);
        assert!((stats.abstention - 30.0).abs() < 1e-9);
        assert!((stats.blancs_nuls - 300.0 / 70.0).abs() < 1e-9);
        assert_eq!(stats.total_votants, 70);
        assert_eq!(stats.data_source, DataSource::Real);
    }

    #[test]
    fn base64_envelope_decodes_to_same_stats() {
        let encoded = STANDARD.encode(SCENARIO_A);
        // Split the base64 the way some APIs wrap long content.
        let wrapped = format!("{}\n{}", &encoded[..10], &encoded[10..]);
        let body = serde_json::json!({ "content": wrapped, "encoding": "base64" }).to_string();
        let payload = Payload::new(body).with_content_type("application/json; charset=utf-8");

        let direct = stats_from_payload(&Payload::new(SCENARIO_A)).unwrap();
        let decoded = stats_from_payload(&payload).unwrap();
        assert_eq!(direct, decoded);
    }

    #[test]
    fn json_without_content_is_a_decode_error() {
        let payload = Payload::new(r#"{"userId": 1, "id": 1, "title": "x"}"#);
        assert!(matches!(stats_from_payload(&payload), Err(FetchError::Decode(_))));
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let payload = Payload::new(r#"{"content": "abc", "encoding": "utf-16"}"#);
        assert!(matches!(unwrap_table(&payload), Err(FetchError::Decode(_))));
    }

    #[test]
    fn bad_cells_contribute_zero_without_aborting() {
        let text = "Inscrits,Votants,Blancs,Nuls,Abstentions\n\
                    100,70,2,1,30\n\
                    abc,,x,-4,\n\
                    50,40,1,1,10";
        let totals = aggregate(text).unwrap();
        assert_eq!(totals.rows, 3);
        assert_eq!(totals.inscrits, 150);
        assert_eq!(totals.votants, 110);
        assert_eq!(totals.blancs, 3);
        assert_eq!(totals.nuls, 2);
        assert_eq!(totals.abstentions, 40);
    }

    #[test]
    fn short_rows_are_tolerated() {
        let text = "Inscrits,Votants,Blancs,Nuls,Abstentions\n100,70\n10,5,1,0,5";
        let totals = aggregate(text).unwrap();
        assert_eq!(totals.inscrits, 110);
        assert_eq!(totals.blancs, 1);
    }

    #[test]
    fn header_only_table_is_an_invalid_aggregate() {
        let err = stats_from_payload(&Payload::new("Inscrits,Votants,Blancs,Nuls,Abstentions\n")).unwrap_err();
        assert_eq!(err, FetchError::InvalidAggregate { inscrits: 0, votants: 0 });
    }

    #[test]
    fn all_zero_rows_are_an_invalid_aggregate() {
        let text = "Inscrits,Votants,Blancs,Nuls,Abstentions\n0,0,0,0,0\n12,0,0,0,12";
        let err = stats_from_payload(&Payload::new(text)).unwrap_err();
        assert_eq!(err, FetchError::InvalidAggregate { inscrits: 12, votants: 0 });
    }

    #[test]
    fn semicolon_tables_with_bom_and_extra_columns() {
        let text = "\u{feff}Code;Libellé;INSCRITS;Votants;Blancs;Nuls;Abstentions\n\
                    01;Ain;1000;800;10;5;200\n\
                    02;Aisne;500;300;3;2;200\n";
        assert_eq!(sniff_delimiter(text), b';');
        let stats = stats_from_payload(&Payload::new(text)).unwrap();
        assert!((stats.participation - 1100.0 / 1500.0 * 100.0).abs() < 1e-9);
        assert!((stats.abstention - 400.0 / 1500.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn missing_required_column_is_a_parse_error() {
        let err = aggregate("Votants,Blancs\n1,2").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn json_content_type_over_a_table_still_parses() {
        let payload = Payload::new(SCENARIO_A).with_content_type("application/json");
        assert_eq!(sniff(&payload), PayloadFormat::Delimited);
        let stats = stats_from_payload(&payload).unwrap();
        assert!((stats.participation - 70.0).abs() < 1e-9);
        assert_eq!(stats.data_source, DataSource::Real);
    }

    #[test]
    fn counts_use_the_leading_integer_part() {
        assert_eq!(parse_count("100.0"), 100);
        assert_eq!(parse_count(" 12abc "), 12);
        assert_eq!(parse_count("+7"), 7);
        assert_eq!(parse_count("-4"), 0);
        assert_eq!(parse_count(".5"), 0);
        assert_eq!(parse_count("99999999999999999999999"), 0);

        let text = "Inscrits,Votants,Blancs,Nuls,Abstentions\n100.0,70.0,2.0,1.0,30.0";
        let stats = stats_from_payload(&Payload::new(text)).unwrap();
        assert!((stats.participation - 70.0).abs() < 1e-9);
        assert_eq!(stats.total_votants, 70);
    }

    #[test]
    fn quoted_comma_does_not_hide_semicolon_delimiter() {
        let text = "Code;\"Libellé, court\";Inscrits;Votants;Blancs;Nuls;Abstentions\n\
                    01;Ain;100;70;2;1;30\n";
        assert_eq!(sniff_delimiter(text), b';');
        let stats = stats_from_payload(&Payload::new(text)).unwrap();
        assert!((stats.participation - 70.0).abs() < 1e-9);

        assert_eq!(sniff_delimiter("Inscrits\tVotants\n1\t1"), b'\t');
        assert_eq!(sniff_delimiter(SCENARIO_A), b',');
    }

    #[test]
    fn response_id_reads_numeric_id() {
        assert_eq!(response_id(&Payload::new(r#"{"id": 3}"#)), Some(3.0));
        assert_eq!(response_id(&Payload::new(r#"{"id": "three"}"#)), None);
        assert_eq!(response_id(&Payload::new(SCENARIO_A)), None);
    }
}
