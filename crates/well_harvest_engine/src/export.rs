use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use harvest_logging::harvest_debug;
use serde_json::json;
use well_harvest_core::{
    CandidateRecord, DiscoveryRecord, NormalizedRecord, DISCOVERY_COLUMNS, OUTPUT_COLUMNS,
};

use crate::harvest::{HarvestReport, Termination};
use crate::persist::{AtomicFileWriter, PersistError};
use crate::pipeline::EnrichmentReport;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("{path:?} has no {column:?} column")]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// Write the discovery export: a header row, then one row per record.
pub fn write_discovery_csv(path: &Path, records: &[CandidateRecord]) -> Result<PathBuf, ExportError> {
    let (writer, filename) = AtomicFileWriter::for_path(path)?;
    let written = writer.write_with(&filename, |out| {
        // Rows may carry more cells than there are named columns.
        let mut table = csv::WriterBuilder::new().flexible(true).from_writer(out);
        table.write_record(DISCOVERY_COLUMNS)?;
        for record in records {
            table.write_record(record.to_row())?;
        }
        table.flush()
    })?;
    Ok(written)
}

/// Read a discovery export by header name. Columns may appear in any order;
/// rows without a link are dropped.
pub fn read_discovery_csv(path: &Path) -> Result<Vec<DiscoveryRecord>, ExportError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.headers()?.clone();

    let positions: Vec<Option<usize>> = DISCOVERY_COLUMNS
        .iter()
        .map(|column| headers.iter().position(|h| h.trim() == *column))
        .collect();
    if positions[1].is_none() {
        return Err(ExportError::MissingColumn {
            path: path.to_path_buf(),
            column: DISCOVERY_COLUMNS[1],
        });
    }

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let values: Vec<String> = positions
            .iter()
            .map(|pos| pos.and_then(|p| row.get(p)).unwrap_or("").to_string())
            .collect();
        let record = DiscoveryRecord::from_values(values);
        if record.link().trim().is_empty() {
            harvest_debug!("Dropping discovery row {} without a link", line + 1);
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

/// Write the enrichment export in schema column order.
pub fn write_normalized_csv(path: &Path, records: &[NormalizedRecord]) -> Result<PathBuf, ExportError> {
    let (writer, filename) = AtomicFileWriter::for_path(path)?;
    let written = writer.write_with(&filename, |out| {
        let mut table = csv::Writer::from_writer(out);
        table.write_record(OUTPUT_COLUMNS)?;
        for record in records {
            table.write_record(record.values())?;
        }
        table.flush()
    })?;
    Ok(written)
}

/// `well_documents.csv` -> `well_documents.summary.json`.
pub fn summary_path(export_path: &Path) -> PathBuf {
    let stem = export_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    export_path.with_file_name(format!("{stem}.summary.json"))
}

pub fn write_discovery_summary(
    path: &Path,
    report: &HarvestReport,
    generated_utc: &str,
) -> Result<PathBuf, ExportError> {
    let termination = match report.termination {
        Termination::Converged => "converged",
        Termination::SafetyBoundReached => "safety_bound_reached",
        Termination::Cancelled => "cancelled",
    };
    let summary = json!({
        "stage": "discovery",
        "generated_utc": generated_utc,
        "records": report.records.len(),
        "cycles": report.cycles,
        "termination": termination,
    });
    write_json(path, &summary)
}

pub fn write_enrichment_summary(
    path: &Path,
    report: &EnrichmentReport,
    generated_utc: &str,
) -> Result<PathBuf, ExportError> {
    let summary = json!({
        "stage": "enrichment",
        "generated_utc": generated_utc,
        "records": report.records.len(),
        "filtered_out": report.filtered_out,
        "skipped_by_cancel": report.skipped_by_cancel,
        "failures": report.failures.iter().map(|f| {
            json!({
                "reference": f.reference,
                "cause": f.cause.to_string(),
            })
        }).collect::<Vec<_>>(),
    });
    write_json(path, &summary)
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<PathBuf, ExportError> {
    let (writer, filename) = AtomicFileWriter::for_path(path)?;
    let text = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    Ok(writer.write(&filename, text.as_bytes())?)
}
