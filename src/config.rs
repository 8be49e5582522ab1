use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::constants::{
    BAUD_RATE, DEFAULT_LOG_FILE, ERROR_BACKOFF_MS, IDLE_POLL_MS, MAX_DATA_POINTS, SERIAL_PORT,
    WARNING_THRESHOLD,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "water_monitor")]
#[command(about = "Read an Arduino water sensor over serial, log to CSV and chart it live")]
pub struct Config {
    /// Serial port path (e.g., /dev/ttyUSB0, /dev/ttyACM0 or COM3)
    #[arg(short, long, default_value = SERIAL_PORT)]
    pub port: String,

    /// Baud rate
    #[arg(short = 'r', long, default_value_t = BAUD_RATE)]
    pub baud_rate: u32,

    /// Readings above this percentage are flagged
    #[arg(short, long, default_value_t = WARNING_THRESHOLD)]
    pub threshold: f64,

    /// Number of readings kept for the chart
    #[arg(short = 'n', long, default_value_t = MAX_DATA_POINTS)]
    pub max_points: usize,

    /// Directory for the CSV data file
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Diagnostics file used while the chart owns the terminal
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Print readings instead of drawing the chart
    #[arg(long)]
    pub headless: bool,

    /// List available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,
}

/// Sleep intervals used by the ingestion loop
#[derive(Debug, Clone, Copy)]
pub struct IngestTiming {
    pub idle_poll: Duration,
    pub error_backoff: Duration,
}

impl Default for IngestTiming {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_millis(IDLE_POLL_MS),
            error_backoff: Duration::from_millis(ERROR_BACKOFF_MS),
        }
    }
}
