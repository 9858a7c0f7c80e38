//! gait_ingest - file adapters around `gait_core`
//!
//! CSV rows → `Sample`s, YAML → `RangeSpec` / `AnalysisConfig`, and the JSON
//! report envelope (schema version, timestamp, input checksums).

pub mod rows;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use gait_core::{analyze_dataset, AnalysisConfig, DatasetCatalog, DatasetSummary, RangeSpec};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub use rows::{read_rows, read_rows_csv, ParseStats, RowSet};

/// Checksummed reference to an input file.
#[derive(Debug, Clone, Serialize)]
pub struct InputFile {
    pub path: String,
    /// SHA256 (hex)
    pub sha256: String,
}

impl InputFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.display().to_string(),
            sha256: sha256_file(path)?,
        })
    }
}

/// JSON document written by `gait_ingest analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub schema_version: String,
    pub engine_version: String,
    /// RFC3339
    pub created_at: String,
    pub data: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_spec: Option<InputFile>,
    pub parse: ParseStats,
    pub features: Vec<String>,
    pub config: AnalysisConfig,
    pub summary: DatasetSummary,
}

/// Options for [`analyze_file`].
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions<'a> {
    pub ranges: Option<&'a Path>,
    pub config: Option<&'a Path>,
    /// Defaults to every feature column in the CSV
    pub features: Option<Vec<String>>,
}

pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(sha256_bytes(&bytes))
}

/// Load and validate a YAML range spec.
pub fn load_range_spec(path: &Path) -> Result<RangeSpec> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read range spec: {}", path.display()))?;
    RangeSpec::from_yaml_str(&yaml)
        .with_context(|| format!("Invalid range spec: {}", path.display()))
}

/// Load and validate a YAML analysis config.
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    AnalysisConfig::from_yaml_str(&yaml)
        .with_context(|| format!("Invalid config: {}", path.display()))
}

/// Read a CSV, run the full analysis, and wrap the result in a report envelope.
pub fn analyze_file(data: &Path, options: &AnalyzeOptions<'_>) -> Result<AnalysisReport> {
    let config = match options.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };
    let spec = options.ranges.map(load_range_spec).transpose()?;
    let set = read_rows_csv(data)?;
    let features = options
        .features
        .clone()
        .unwrap_or_else(|| set.features.clone());

    let summary = analyze_dataset(&set.rows, &features, spec.as_ref(), &config)
        .context("Analysis failed")?;

    Ok(AnalysisReport {
        schema_version: gait_core::SCHEMA_VERSION.to_string(),
        engine_version: gait_core::VERSION.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        data: InputFile::from_path(data)?,
        range_spec: options.ranges.map(InputFile::from_path).transpose()?,
        parse: set.stats,
        features,
        config,
        summary,
    })
}

/// Subjects / tasks / features / completeness of a CSV.
pub fn catalog_file(data: &Path, phase_points: usize) -> Result<DatasetCatalog> {
    let set = read_rows_csv(data)?;
    Ok(DatasetCatalog::from_rows(&set.rows, phase_points))
}

/// Pretty-print `value` as JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gait_core::{PassRate, PHASE_POINTS};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_temp(contents: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        Ok(file)
    }

    /// Two complete walk cycles, the second with one knee value at 2.0.
    fn gait_csv() -> String {
        let mut csv = String::from("subject,task,step,phase_index,knee_ipsi_rad,knee_contra_rad\n");
        for cycle in 1..=2 {
            for p in 0..PHASE_POINTS {
                let knee = if cycle == 2 && p == 5 { 2.0 } else { 0.5 };
                csv.push_str(&format!("S01,walk,{},{},{},0.4\n", cycle, p, knee));
            }
        }
        csv
    }

    const RANGES: &str = "walk:\n  knee_ipsi_rad:\n    - { phase_range: [0, 100], min: 0.0, max: 1.0 }\n";

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_analyze_file_end_to_end() -> Result<()> {
        let data = write_temp(&gait_csv())?;
        let ranges = write_temp(RANGES)?;
        let options = AnalyzeOptions {
            ranges: Some(ranges.path()),
            ..AnalyzeOptions::default()
        };

        let report = analyze_file(data.path(), &options)?;

        assert_eq!(report.schema_version, gait_core::SCHEMA_VERSION);
        assert_eq!(report.data.sha256, sha256_file(data.path())?);
        assert_eq!(report.features, vec!["knee_ipsi_rad", "knee_contra_rad"]);
        assert_eq!(report.parse.parsed as usize, 2 * PHASE_POINTS);
        assert_eq!(report.summary.tasks["walk"].pass_rate, PassRate::Defined(50.0));
        assert!(chrono::DateTime::parse_from_rfc3339(&report.created_at).is_ok());
        Ok(())
    }

    #[test]
    fn test_config_file_is_applied() -> Result<()> {
        let data = write_temp(&gait_csv())?;
        let config = write_temp("rounding_decimals: 0\npass_policy:\n  kind: min_fraction\n  fraction: 0.99\n")?;
        let ranges = write_temp(RANGES)?;
        let options = AnalyzeOptions {
            ranges: Some(ranges.path()),
            config: Some(config.path()),
            features: Some(vec!["knee_ipsi_rad".to_string()]),
        };

        let report = analyze_file(data.path(), &options)?;
        // one bad point in 150 passes a 99% threshold
        assert_eq!(report.summary.tasks["walk"].pass_rate, PassRate::Defined(100.0));
        assert_eq!(report.config.rounding_decimals, 0);
        Ok(())
    }

    #[test]
    fn test_invalid_range_spec_is_rejected() -> Result<()> {
        let ranges = write_temp("walk:\n  knee_ipsi_rad:\n    - { phase_range: [0, 40], max: 1.0 }\n")?;
        let err = load_range_spec(ranges.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("bins end at 40"));
        Ok(())
    }

    #[test]
    fn test_catalog_and_write_json() -> Result<()> {
        let data = write_temp(&gait_csv())?;
        let catalog = catalog_file(data.path(), PHASE_POINTS)?;
        assert_eq!(catalog.total_complete_cycles(), 2);

        let dir = TempDir::new()?;
        let out = dir.path().join("nested").join("catalog.json");
        write_json(&out, &catalog)?;
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
        assert_eq!(value["tasks"][0], "walk");
        Ok(())
    }
}
