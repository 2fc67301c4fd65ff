// src/store.rs
//
// DaySeries: one append-only CSV per calendar date.
//
//   minute,id,name,TotalCount,UnavailableSpace,AvailableSpace
//
// Rows are never rewritten, re-sorted or deduplicated. Several rows for the
// same (minute, id) are legal; readers resolve them last-value-wins.
// No locking: at most one writer per date at a time is assumed.

use std::{
    collections::{BTreeMap, HashMap},
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::config::consts::DAY_HEADER;
use crate::file::{day_path, ensure_directory};
use crate::specs::area_tree::Snapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create store directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to flush {path} to disk")]
    Sync {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} lacks columns: {}", missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
}

/// What an append did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Appended {
    /// Empty snapshot: the file was not created nor touched.
    Nothing,
    Rows { path: PathBuf, rows: usize, created: bool },
}

/// One DaySeries row as read back. `id` stays text since it may be either
/// numeric or textual on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayRow {
    pub minute: i64,
    pub id: String,
    pub name: String,
    #[serde(rename = "TotalCount")]
    pub total: i64,
    #[serde(rename = "UnavailableSpace")]
    pub unavailable: i64,
    #[serde(rename = "AvailableSpace")]
    pub available: i64,
}

pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        day_path(&self.dir, date)
    }

    /// Append `snap` to the file for `date`, writing the header first when the
    /// file is new (or empty). Durable on return.
    pub fn append(&self, date: NaiveDate, snap: &Snapshot) -> Result<Appended, StoreError> {
        if snap.is_empty() {
            return Ok(Appended::Nothing);
        }

        ensure_directory(&self.dir)
            .map_err(|source| StoreError::CreateDir { path: self.dir.clone(), source })?;

        let path = self.path_for(date);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Open { path: path.clone(), source })?;
        let created = file
            .metadata()
            .map_err(|source| StoreError::Open { path: path.clone(), source })?
            .len() == 0;

        let write_err = |source| StoreError::Write { path: path.clone(), source };
        let mut w = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        if created {
            w.write_record(DAY_HEADER).map_err(write_err)?;
        }
        for rec in &snap.records {
            w.serialize(rec).map_err(write_err)?;
        }

        let file = w
            .into_inner()
            .map_err(|e| StoreError::Sync { path: path.clone(), source: e.into_error() })?;
        file.sync_all()
            .map_err(|source| StoreError::Sync { path: path.clone(), source })?;

        tracing::info!(path = %path.display(), rows = snap.len(), created, "appended snapshot");
        Ok(Appended::Rows { path, rows: snap.len(), created })
    }

    /// Read a whole DaySeries back, in file order. Extra columns are ignored;
    /// a day with no file reads as no rows.
    pub fn load_day(&self, date: NaiveDate) -> Result<Vec<DayRow>, StoreError> {
        let path = self.path_for(date);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let read_err = |source| StoreError::Read { path: path.clone(), source };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(read_err)?;

        let headers = rdr.headers().map_err(read_err)?.clone();
        let missing: Vec<String> = DAY_HEADER
            .into_iter()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .map(|col| s!(col))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::MissingColumns { path: path.clone(), missing });
        }

        let mut rows: Vec<DayRow> = Vec::new();
        for row in rdr.deserialize::<DayRow>() {
            rows.push(row.map_err(read_err)?);
        }
        Ok(rows)
    }
}

/// minute → (id → available), later rows overriding earlier ones.
pub fn pivot_available(rows: &[DayRow]) -> BTreeMap<i64, BTreeMap<String, i64>> {
    let mut out: BTreeMap<i64, BTreeMap<String, i64>> = BTreeMap::new();
    for r in rows {
        out.entry(r.minute).or_default().insert(r.id.clone(), r.available);
    }
    out
}

/// Most recent row per area, areas in order of first appearance.
pub fn latest_by_area(rows: &[DayRow]) -> Vec<DayRow> {
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<DayRow> = Vec::new();
    for r in rows {
        match slot.get(r.id.as_str()) {
            Some(&i) => out[i] = r.clone(),
            None => {
                slot.insert(r.id.as_str(), out.len());
                out.push(r.clone());
            }
        }
    }
    out
}
