use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Instant,
};
use chrono::{DateTime, Local};

use crate::reading::Reading;
use crate::window::{Window, WindowSnapshot};

// Counters reported by the ingestion worker
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub accepted: u64,
    pub rejected: u64,
    pub read_errors: u64,
    pub peak: Option<(f64, DateTime<Local>)>,
    pub last_event: Option<String>,
}

/// State shared between the ingestion worker (sole writer) and the UI.
#[derive(Debug)]
pub struct Monitor {
    window: Mutex<Window>,
    stats: Mutex<IngestStats>,
    running: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Monitor {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Mutex::new(Window::new(capacity)),
            stats: Mutex::new(IngestStats::default()),
            running: AtomicBool::new(true),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn record(&self, reading: &Reading) {
        lock(&self.window).push(reading);

        let mut stats = lock(&self.stats);
        stats.accepted += 1;
        if stats.peak.map_or(true, |(peak, _)| reading.value > peak) {
            stats.peak = Some((reading.value, reading.timestamp));
        }
    }

    pub fn record_rejected(&self, message: String) {
        let mut stats = lock(&self.stats);
        stats.rejected += 1;
        stats.last_event = Some(message);
    }

    pub fn record_read_error(&self, message: String) {
        let mut stats = lock(&self.stats);
        stats.read_errors += 1;
        stats.last_event = Some(message);
    }

    pub fn set_last_event(&self, message: String) {
        lock(&self.stats).last_event = Some(message);
    }

    /// Copy of the window; the lock is released before this returns.
    pub fn snapshot(&self) -> WindowSnapshot {
        lock(&self.window).snapshot()
    }

    pub fn stats(&self) -> IngestStats {
        lock(&self.stats).clone()
    }
}

// UI-side state, refreshed once per tick
pub struct App {
    pub snapshot: WindowSnapshot,
    pub stats: IngestStats,
    pub threshold: f64,
    pub last_tick: Instant,
}

impl App {
    pub fn new(threshold: f64) -> App {
        App {
            snapshot: WindowSnapshot::default(),
            stats: IngestStats::default(),
            threshold,
            last_tick: Instant::now(),
        }
    }

    pub fn on_tick(&mut self, monitor: &Monitor) {
        self.snapshot = monitor.snapshot();
        debug_assert!(self.snapshot.is_consistent());
        self.stats = monitor.stats();
    }
}
