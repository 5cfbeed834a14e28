//! Report Sink - CSV rendering, file naming, and the storage seam.
//!
//! Deliberately thin: the only contracts worth testing are the literal
//! header text, the field order, and the file-name shape.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::{Result, ScanError};
use crate::reflect::ReflectanceRecord;

/// Render records as delimited text.
///
/// Header is literally `wavelength,intensity,reflectance`; one line per
/// record, comma-joined. Numbers are rendered in their shortest `Display`
/// form (`1`, not `1.0`), matching the persisted artifacts of the original
/// acquisition software. Absent reflectance renders as an empty field.
pub fn render_csv(records: &[ReflectanceRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["wavelength", "intensity", "reflectance"])?;
    for record in records {
        let reflectance = record
            .reflectance
            .map(|r| r.to_string())
            .unwrap_or_default();
        writer.write_record([
            record.wavelength.to_string(),
            record.intensity.to_string(),
            reflectance,
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ScanError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Build the artifact file name: `{name}_{timestamp}.csv`.
///
/// The timestamp is the UTC ISO-8601 instant with `-`/`:` separators
/// stripped and cut to 15 characters, i.e. second granularity. Repeated
/// requests with the same name inside one second collide and overwrite;
/// that matches the original system and is accepted.
pub fn report_file_name(name: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.csv", name, at.format("%Y%m%dT%H%M%S"))
}

/// Storage collaborator the sink hands finished reports to.
pub trait ReportStore {
    fn store(&self, file_name: &str, contents: &str) -> Result<()>;
}

/// Stores reports as files under one directory, creating it on demand.
#[derive(Clone, Debug)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportStore for DirStore {
    fn store(&self, file_name: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(file_name), contents)?;
        Ok(())
    }
}

/// Render and persist a record set; returns the generated file name.
pub fn persist(
    store: &dyn ReportStore,
    name: &str,
    records: &[ReflectanceRecord],
) -> Result<String> {
    let csv = render_csv(records)?;
    let file_name = report_file_name(name, Utc::now());
    store.store(&file_name, &csv)?;
    tracing::debug!(file = %file_name, rows = records.len(), "report persisted");
    Ok(file_name)
}
