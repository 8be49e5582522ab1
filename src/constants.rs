// Serial link defaults (Arduino side prints one percentage per line)
pub const SERIAL_PORT: &str = "/dev/ttyUSB0";
pub const BAUD_RATE: u32 = 9600;
pub const SERIAL_TIMEOUT_MS: u64 = 1000;
pub const ARDUINO_RESET_DELAY_MS: u64 = 2000;

pub const WARNING_THRESHOLD: f64 = 70.0;
pub const MAX_DATA_POINTS: usize = 100;

pub const REDRAW_INTERVAL_MS: u64 = 500;
pub const IDLE_POLL_MS: u64 = 100;
pub const ERROR_BACKOFF_MS: u64 = 1000;
pub const SHUTDOWN_GRACE_MS: u64 = 1000;

// Chart layout
pub const Y_BOUNDS: [f64; 2] = [-5.0, 105.0];
pub const DRY_UPPER: f64 = 30.0;
pub const MODERATE_UPPER: f64 = 70.0;
pub const WET_UPPER: f64 = 100.0;
pub const MAX_X_LABELS: usize = 10;

pub const CSV_PREFIX: &str = "water_sensor_data";
pub const CSV_HEADER: &str = "Timestamp,Moisture Level (%),Warning";
pub const DEFAULT_LOG_FILE: &str = "water_monitor.log";
