use crate::constants::{DRY_UPPER, MODERATE_UPPER, WET_UPPER};

// Moisture bands drawn behind the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Dry,
    Moderate,
    Wet,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Dry, Band::Moderate, Band::Wet];

    /// Band containing `value`, or `None` outside 0-100%.
    pub fn classify(value: f64) -> Option<Band> {
        if !(0.0..=WET_UPPER).contains(&value) {
            None
        } else if value < DRY_UPPER {
            Some(Band::Dry)
        } else if value < MODERATE_UPPER {
            Some(Band::Moderate)
        } else {
            Some(Band::Wet)
        }
    }

    pub fn label(self) -> String {
        let (name, lo, hi) = match self {
            Band::Dry => ("Dry", 0.0, DRY_UPPER),
            Band::Moderate => ("Moderate", DRY_UPPER, MODERATE_UPPER),
            Band::Wet => ("Wet", MODERATE_UPPER, WET_UPPER),
        };
        format!("{} ({}-{}%)", name, lo, hi)
    }
}

/// Indices that get an x-axis label: every `step`-th reading, starting at 0,
/// with `step` chosen so no more than `max_labels` are returned.
pub fn tick_indices(len: usize, max_labels: usize) -> Vec<usize> {
    if len == 0 || max_labels == 0 {
        return Vec::new();
    }
    let step = len.div_ceil(max_labels).max(1);
    (0..len).step_by(step).collect()
}

/// Data value at the vertical centre of terminal row `row` (0 = top) when
/// `height` rows span `bounds`.
pub fn row_center_value(row: u16, height: u16, bounds: [f64; 2]) -> f64 {
    let span = bounds[1] - bounds[0];
    let per_row = span / height.max(1) as f64;
    bounds[1] - (row as f64 + 0.5) * per_row
}

/// Terminal row (0 = top) showing `value` when `height` rows span `bounds`.
pub fn value_row(value: f64, height: u16, bounds: [f64; 2]) -> u16 {
    let span = bounds[1] - bounds[0];
    let frac = ((bounds[1] - value) / span).clamp(0.0, 1.0);
    let row = (frac * height as f64) as u16;
    row.min(height.saturating_sub(1))
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(9)]
    #[case(10)]
    #[case(11)]
    #[case(19)]
    #[case(57)]
    #[case(100)]
    fn never_more_than_ten_labels(#[case] len: usize) {
        let ticks = tick_indices(len, 10);
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= 10, "{} labels for {} points", ticks.len(), len);
        assert_eq!(ticks[0], 0);
        assert!(ticks.iter().all(|&i| i < len));
    }

    #[test]
    fn small_windows_label_every_point() {
        assert_eq!(tick_indices(4, 10), vec![0, 1, 2, 3]);
        assert_eq!(tick_indices(100, 10), (0..100).step_by(10).collect::<Vec<_>>());
        assert!(tick_indices(0, 10).is_empty());
    }

    #[rstest]
    #[case(-0.1, None)]
    #[case(0.0, Some(Band::Dry))]
    #[case(29.9, Some(Band::Dry))]
    #[case(30.0, Some(Band::Moderate))]
    #[case(69.9, Some(Band::Moderate))]
    #[case(70.0, Some(Band::Wet))]
    #[case(100.0, Some(Band::Wet))]
    #[case(100.1, None)]
    fn band_boundaries(#[case] value: f64, #[case] band: Option<Band>) {
        assert_eq!(Band::classify(value), band);
    }

    #[test]
    fn band_labels() {
        let labels: Vec<String> = Band::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(labels, vec!["Dry (0-30%)", "Moderate (30-70%)", "Wet (70-100%)"]);
    }

    #[test]
    fn row_mapping() {
        let bounds = [-5.0, 105.0];
        // 11 rows of 10% each: row 0 covers 95..105
        assert_eq!(row_center_value(0, 11, bounds), 100.0);
        assert_eq!(row_center_value(10, 11, bounds), 0.0);
        assert_eq!(value_row(105.0, 11, bounds), 0);
        assert_eq!(value_row(-5.0, 11, bounds), 10);
        assert_eq!(value_row(70.0, 11, bounds), 3);
    }

    #[test]
    fn percent_format() {
        assert_eq!(format_percent(12.34), "12.3%");
        assert_eq!(format_percent(42.0), "42.0%");
    }
}
