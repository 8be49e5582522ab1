mod app;
mod config;
mod constants;
mod error;
mod ingest;
mod logbook;
mod reading;
mod serial;
mod ui;
mod util;
mod window;

use std::{
    error::Error,
    fs::OpenOptions,
    process,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use chrono::Local;
use clap::Parser;
use log::{error, info, warn};

use crate::app::Monitor;
use crate::config::{Config, IngestTiming};
use crate::constants::{ARDUINO_RESET_DELAY_MS, IDLE_POLL_MS, SERIAL_TIMEOUT_MS, SHUTDOWN_GRACE_MS};
use crate::error::MonitorError;
use crate::ingest::Ingest;
use crate::logbook::ReadingLog;
use crate::serial::SerialLineSource;

fn init_logging(config: &Config) -> Result<(), MonitorError> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    // The chart owns the terminal, so diagnostics go to a file
    if !config.headless {
        let file = OpenOptions::new().create(true).append(true).open(&config.log_file)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().map_err(|e| MonitorError::Logger(e.to_string()))
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::parse();

    if config.list_ports {
        for port in serial::list_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    init_logging(&config)?;

    let csv_path = logbook::log_path(&config.output_dir, Local::now());
    println!("Water Sensor Monitor");
    println!("Data will be saved to {}", csv_path.display());

    let timeout = Duration::from_millis(SERIAL_TIMEOUT_MS);
    let port = match serial::open_port(&config.port, config.baud_rate, timeout) {
        Ok(port) => port,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            eprintln!("Please check connections and port name.");
            process::exit(1);
        }
    };
    info!("Connected to Arduino on {} at {} baud", config.port, config.baud_rate);
    println!("Connected to Arduino on {}", config.port);

    // Opening the port resets the board
    thread::sleep(Duration::from_millis(ARDUINO_RESET_DELAY_MS));

    let log = ReadingLog::create(&csv_path)?;
    let monitor = Arc::new(Monitor::new(config.max_points));
    {
        let monitor = Arc::clone(&monitor);
        ctrlc::set_handler(move || monitor.stop()).map_err(MonitorError::from)?;
    }

    let ingest = Ingest {
        threshold: config.threshold,
        timing: IngestTiming::default(),
    };
    let worker = ingest.spawn(SerialLineSource::new(port), log, Arc::clone(&monitor));

    let res = if config.headless {
        wait_headless(&monitor, &worker);
        Ok(())
    } else {
        ui::run(Arc::clone(&monitor), config.threshold, &config.port)
    };

    monitor.stop();
    shutdown(worker);

    println!("Program terminated.");
    println!("Data saved to {}", csv_path.display());
    res.map_err(Into::into)
}

// Block until Ctrl-C or until the worker gives up on its own.
fn wait_headless(monitor: &Monitor, worker: &JoinHandle<error::Result<u64>>) {
    println!("Logging readings to stderr, press Ctrl-C to stop");
    while monitor.is_running() && !worker.is_finished() {
        thread::sleep(Duration::from_millis(IDLE_POLL_MS));
    }
}

// Give the worker a bounded grace period to notice the stop flag. The
// worker owns the port and the CSV file, so both close when it returns.
fn shutdown(worker: JoinHandle<error::Result<u64>>) {
    let deadline = Instant::now() + Duration::from_millis(SHUTDOWN_GRACE_MS);
    while !worker.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    if !worker.is_finished() {
        warn!("ingestion worker still busy after {}ms, exiting anyway", SHUTDOWN_GRACE_MS);
        return;
    }
    match worker.join() {
        Ok(Ok(rows)) => info!("{} readings logged", rows),
        Ok(Err(e)) => error!("ingestion ended with error: {}", e),
        Err(_) => error!("ingestion worker panicked"),
    }
}
