//! CSV row source.
//!
//! Expected layout: a header row with `subject`, `task`, `cycle_id` and
//! `phase_index` columns (any order); every other column is a feature.
//!
//! | column        | aliases               |
//! |---------------|-----------------------|
//! | `cycle_id`    | `step`, `cycle`       |
//! | `phase_index` | `phase_ipsi`, `phase` |
//!
//! Empty cells and `nan` / `NaN` / `NA` become NaN. A feature cell that does
//! not parse is counted and stored as NaN. A row whose key columns do not
//! parse is skipped.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use gait_core::Sample;
use serde::Serialize;

const SUBJECT: &[&str] = &["subject"];
const TASK: &[&str] = &["task"];
const CYCLE_ID: &[&str] = &["cycle_id", "step", "cycle"];
const PHASE_INDEX: &[&str] = &["phase_index", "phase_ipsi", "phase"];

const MISSING_TOKENS: &[&str] = &["", "nan", "NaN", "NA"];

/// CSV parsing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub total_rows: u32,
    pub parsed: u32,
    /// Rows dropped because a key column was unreadable
    pub skipped_rows: u32,
    /// Feature cells that failed to parse (stored as NaN)
    pub bad_cells: u32,
    pub missing_cells: u32,
}

/// Rows read from one file plus the feature columns found in its header.
#[derive(Debug, Clone)]
pub struct RowSet {
    pub rows: Vec<Sample>,
    pub features: Vec<String>,
    pub stats: ParseStats,
}

struct Columns {
    subject: usize,
    task: usize,
    cycle_id: usize,
    phase_index: usize,
    /// (column index, feature name)
    features: Vec<(usize, String)>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}'))
            .collect();

        let find = |aliases: &[&str]| -> Result<usize> {
            aliases
                .iter()
                .find_map(|alias| names.iter().position(|n| n == alias))
                .with_context(|| format!("Missing required column '{}'", aliases[0]))
        };

        let subject = find(SUBJECT)?;
        let task = find(TASK)?;
        let cycle_id = find(CYCLE_ID)?;
        let phase_index = find(PHASE_INDEX)?;
        let keys = [subject, task, cycle_id, phase_index];

        let features: Vec<(usize, String)> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| !keys.contains(i))
            .map(|(i, n)| (i, n.to_string()))
            .collect();
        if features.is_empty() {
            bail!("CSV has no feature columns");
        }

        Ok(Self {
            subject,
            task,
            cycle_id,
            phase_index,
            features,
        })
    }
}

/// 2^63; `i64::MAX as f64` rounds up to this.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Integer key cell; accepts `3` and `3.0`. Floats outside the i64 range are
/// rejected rather than saturated.
fn parse_key(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(v) = cell.parse::<i64>() {
        return Some(v);
    }
    let v = cell.parse::<f64>().ok()?;
    let in_range = (-I64_BOUND..I64_BOUND).contains(&v);
    (in_range && v.fract() == 0.0).then_some(v as i64)
}

/// Read rows from any CSV reader.
pub fn read_rows<R: Read>(input: R) -> Result<RowSet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let columns = Columns::from_headers(&headers)?;

    let mut rows = Vec::new();
    let mut stats = ParseStats::default();

    for result in reader.records() {
        stats.total_rows += 1;
        let line = stats.total_rows + 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                stats.skipped_rows += 1;
                eprintln!("Warning: Line {} - unreadable record: {}", line, e);
                continue;
            }
        };
        let cell = |i: usize| record.get(i).unwrap_or("").trim();

        let (Some(cycle_id), Some(phase_index)) =
            (parse_key(cell(columns.cycle_id)), parse_key(cell(columns.phase_index)))
        else {
            stats.skipped_rows += 1;
            eprintln!(
                "Warning: Line {} - invalid cycle/phase '{}' / '{}', skipping",
                line,
                cell(columns.cycle_id),
                cell(columns.phase_index)
            );
            continue;
        };
        let (subject, task) = (cell(columns.subject), cell(columns.task));
        if subject.is_empty() || task.is_empty() {
            stats.skipped_rows += 1;
            eprintln!("Warning: Line {} - empty subject or task, skipping", line);
            continue;
        }

        let mut sample = Sample::new(subject, task, cycle_id, phase_index);
        for (i, name) in &columns.features {
            let raw = cell(*i);
            let value = if MISSING_TOKENS.contains(&raw) {
                stats.missing_cells += 1;
                f64::NAN
            } else {
                raw.parse::<f64>().unwrap_or_else(|_| {
                    stats.bad_cells += 1;
                    f64::NAN
                })
            };
            sample = sample.with_feature(name, value);
        }

        rows.push(sample);
        stats.parsed += 1;
    }

    Ok(RowSet {
        rows,
        features: columns.features.into_iter().map(|(_, n)| n).collect(),
        stats,
    })
}

/// Read rows from a CSV file.
pub fn read_rows_csv(path: &Path) -> Result<RowSet> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_rows(file).with_context(|| format!("Failed to parse CSV file: {}", path.display()))
}
