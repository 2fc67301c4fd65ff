// src/file.rs

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;

use crate::config::consts::{DATE_FORMAT, STORE_EXT};

/// `<dir>/<YYYY-MM-DD>.csv`
pub fn day_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.{}", date.format(DATE_FORMAT), STORE_EXT))
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::other(format!(
            "Path exists but is not a directory: {}", dir.display()
        )));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}
