use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use chrono::{DateTime, Local};

use crate::constants::{CSV_HEADER, CSV_PREFIX};
use crate::error::Result;
use crate::reading::Reading;

/// `water_sensor_data_YYYYmmdd_HHMMSS.csv` inside `dir`
pub fn log_path(dir: &Path, started: DateTime<Local>) -> PathBuf {
    dir.join(format!("{}_{}.csv", CSV_PREFIX, started.format("%Y%m%d_%H%M%S")))
}

// Append-only CSV log. Every row is flushed before `append` returns.
pub struct ReadingLog<W: Write> {
    out: W,
    rows: u64,
}

impl ReadingLog<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        ReadingLog::new(BufWriter::new(file))
    }
}

impl<W: Write> ReadingLog<W> {
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", CSV_HEADER)?;
        out.flush()?;
        Ok(Self { out, rows: 0 })
    }

    pub fn append(&mut self, reading: &Reading) -> Result<()> {
        writeln!(self.out, "{}", format_row(reading))?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn format_row(reading: &Reading) -> String {
    format!(
        "{},{:?},{}",
        reading.timestamp.format("%Y-%m-%d %H:%M:%S"),
        reading.value,
        bool_text(reading.exceeds_threshold)
    )
}

/// `True` / `False`, as existing data files spell the warning column
pub fn bool_text(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}
