use chrono::{DateTime, Local};

use crate::error::{MonitorError, Result};

/// One moisture measurement as received from the sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Local>,
    pub value: f64,
    pub exceeds_threshold: bool,
}

impl Reading {
    pub fn new(value: f64, threshold: f64, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            value,
            exceeds_threshold: value > threshold,
        }
    }
}

/// Parse a single text line from the Arduino into a reading.
///
/// The line must hold one finite floating point number. Values outside
/// 0-100 are accepted unchanged.
pub fn parse_reading(line: &str, threshold: f64, now: DateTime<Local>) -> Result<Reading> {
    let trimmed = line.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Reading::new(value, threshold, now)),
        _ => Err(MonitorError::InvalidReading(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::below("42.0", 42.0, false)]
    #[case::at_threshold("70", 70.0, false)]
    #[case::above("71.5", 71.5, true)]
    #[case::padded("  12.25\r", 12.25, false)]
    #[case::negative("-3", -3.0, false)]
    #[case::over_hundred("140.5", 140.5, true)]
    fn parses_valid_lines(#[case] line: &str, #[case] value: f64, #[case] warning: bool) {
        let reading = parse_reading(line, 70.0, Local::now()).unwrap();
        assert_eq!(reading.value, value);
        assert_eq!(reading.exceeds_threshold, warning);
    }

    #[rstest]
    #[case::text("not-a-number")]
    #[case::empty("")]
    #[case::two_values("12 13")]
    #[case::nan("NaN")]
    #[case::infinite("inf")]
    #[case::unit_suffix("55%")]
    fn rejects_malformed_lines(#[case] line: &str) {
        let err = parse_reading(line, 70.0, Local::now()).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidReading(_)));
    }

    #[test]
    fn threshold_flag_is_strictly_greater() {
        let now = Local::now();
        for value in [0.0, 69.99, 70.0, 70.01, 100.0] {
            let reading = Reading::new(value, 70.0, now);
            assert_eq!(reading.exceeds_threshold, value > 70.0);
        }
    }
}
