//! Error types for the monitor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// Port could not be opened at startup (fatal)
    #[error("Error opening serial port {port}: {source}")]
    SerialOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Line did not hold a finite number
    #[error("Received invalid data: {0}")]
    InvalidReading(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Logger setup failed: {0}")]
    Logger(String),

    #[error("Signal handler setup failed: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl MonitorError {
    #[must_use]
    pub fn serial_open(port: &str, source: serialport::Error) -> Self {
        Self::SerialOpen {
            port: port.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::InvalidReading("abc".to_string());
        assert_eq!(err.to_string(), "Received invalid data: abc");

        let err = MonitorError::serial_open(
            "/dev/ttyUSB0",
            serialport::Error::new(serialport::ErrorKind::NoDevice, "not found"),
        );
        assert_eq!(
            err.to_string(),
            "Error opening serial port /dev/ttyUSB0: not found"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: MonitorError = io.into();
        assert!(matches!(err, MonitorError::Io(_)));
    }
}
