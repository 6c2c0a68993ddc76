use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use common::prelude::ReportRow;

const FILE_PREFIX: &str = "report_";
const FILE_SUFFIX: &str = ".json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `report_YYYYMMDD_HHMMSS<extension>`
pub fn report_file_name(at: NaiveDateTime, extension: &str) -> String {
    format!("{}{}{}", FILE_PREFIX, at.format(TIMESTAMP_FORMAT), extension)
}

/// Timestamp encoded in a report file name, if it is one
fn parse_file_name(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// A directory of previously computed reports, one JSON file per run.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

/// A saved report file and the time it was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    pub path: PathBuf,
    pub taken_at: NaiveDateTime,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `rows` as a new report taken at `at`
    pub fn save(&self, rows: &[ReportRow], at: NaiveDateTime) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(report_file_name(at, FILE_SUFFIX));

        // write next to the target and rename, so readers never see half a file
        let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;
        let mut writer = BufWriter::new(file.as_file_mut());
        serde_json::to_writer(&mut writer, rows)?;
        writer.flush()?;
        drop(writer);
        file.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        tracing::info!(path = %path.display(), rows = rows.len(), "saved report");
        Ok(path)
    }

    /// Every saved report, newest first
    pub fn reports(&self) -> Result<Vec<StoredReport>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reports = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(taken_at) = name.to_str().and_then(parse_file_name) else {
                continue;
            };
            reports.push(StoredReport {
                path: entry.path(),
                taken_at,
            });
        }

        reports.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
        Ok(reports)
    }

    pub fn load(&self, stored: &StoredReport) -> Result<Vec<ReportRow>, StoreError> {
        let file = fs::File::open(&stored.path)?;
        let rows = serde_json::from_reader(BufReader::new(file))?;
        Ok(rows)
    }

    /// Load the newest report taken less than `max_age` before `now`.
    ///
    /// Reports that fail to load are logged and skipped in favour of the
    /// next newest one.
    pub fn load_recent(
        &self,
        max_age: Duration,
        now: NaiveDateTime,
    ) -> Result<Option<(StoredReport, Vec<ReportRow>)>, StoreError> {
        for stored in self.reports()? {
            let age = now - stored.taken_at;
            if age >= max_age {
                tracing::info!(
                    path = %stored.path.display(),
                    age_days = age.num_days(),
                    "most recent report is too old to reuse"
                );
                break;
            }

            match self.load(&stored) {
                Ok(rows) => {
                    tracing::info!(
                        path = %stored.path.display(),
                        age_hours = format!("{:.1}", age.num_seconds() as f64 / 3600.0),
                        "reusing recent report"
                    );
                    return Ok(Some((stored, rows)));
                }
                Err(e) => {
                    tracing::warn!(path = %stored.path.display(), "ignoring unreadable report: {}", e);
                }
            }
        }

        Ok(None)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed saved report: {0}")]
    Json(#[from] serde_json::Error),
}
