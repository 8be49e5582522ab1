use std::{
    io::Write,
    sync::Arc,
    thread::{self, JoinHandle},
};
use chrono::Local;
use log::{debug, error, info, warn};

use crate::app::Monitor;
use crate::config::IngestTiming;
use crate::error::{MonitorError, Result};
use crate::logbook::{bool_text, ReadingLog};
use crate::reading::parse_reading;
use crate::serial::LineSource;

pub struct Ingest {
    pub threshold: f64,
    pub timing: IngestTiming,
}

impl Ingest {
    /// Read, parse, store and log lines until the monitor is stopped.
    ///
    /// Malformed lines and read errors are reported and skipped. Only a
    /// failure to write the CSV log ends the loop early.
    pub fn run<S: LineSource, W: Write>(
        &self,
        source: &mut S,
        log: &mut ReadingLog<W>,
        monitor: &Monitor,
    ) -> Result<u64> {
        while monitor.is_running() {
            match source.poll_line() {
                Ok(Some(line)) => self.handle_line(&line, log, monitor)?,
                Ok(None) => thread::sleep(self.timing.idle_poll),
                Err(e) => {
                    let msg = format!("Error reading from serial port: {}", e);
                    warn!("{}", msg);
                    monitor.record_read_error(msg);
                    thread::sleep(self.timing.error_backoff);
                }
            }
        }
        debug!("ingestion stopped after {} rows", log.rows());
        Ok(log.rows())
    }

    fn handle_line<W: Write>(
        &self,
        line: &str,
        log: &mut ReadingLog<W>,
        monitor: &Monitor,
    ) -> Result<()> {
        let reading = match parse_reading(line, self.threshold, Local::now()) {
            Ok(reading) => reading,
            Err(e @ MonitorError::InvalidReading(_)) => {
                warn!("{}", e);
                monitor.record_rejected(e.to_string());
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        monitor.record(&reading);
        log.append(&reading)?;

        info!("Moisture: {}%, Warning: {}", reading.value, bool_text(reading.exceeds_threshold));
        Ok(())
    }

    /// Run the loop on a dedicated worker thread. The worker owns both the
    /// line source and the log, so they are dropped (port closed, file
    /// flushed) when it finishes.
    pub fn spawn<S, W>(
        self,
        mut source: S,
        mut log: ReadingLog<W>,
        monitor: Arc<Monitor>,
    ) -> JoinHandle<Result<u64>>
    where
        S: LineSource + Send + 'static,
        W: Write + Send + 'static,
    {
        thread::spawn(move || {
            let res = self.run(&mut source, &mut log, &monitor);
            if let Err(e) = &res {
                error!("ingestion terminated: {}", e);
                monitor.set_last_event(format!("Ingestion stopped: {}", e));
            }
            res
        })
    }
}
