use crate::progress::ProgressPoint;

/// Compute X (seconds) and Y (WPM) bounds for the game-over chart
pub fn compute_chart_params(points: &[ProgressPoint], time_limit_secs: f64) -> (f64, f64) {
    let highest_wpm = points.iter().map(|p| p.wpm).fold(0.0, f64::max);

    let overall_duration = points
        .last()
        .map(|p| p.secs)
        .unwrap_or(time_limit_secs)
        .max(1.0);

    (overall_duration, highest_wpm.ceil().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[], 60.0);
        assert_eq!(x, 60.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_uses_last_point_and_peak() {
        let points = [
            ProgressPoint::new(4.0, 31.2, 0),
            ProgressPoint::new(9.5, 44.7, 40),
            ProgressPoint::new(15.0, 38.0, 36),
        ];
        assert_eq!(compute_chart_params(&points, 60.0), (15.0, 45.0));
    }

    #[test]
    fn test_short_sessions_span_at_least_a_second() {
        let points = [ProgressPoint::new(0.4, 12.0, 12)];
        assert_eq!(compute_chart_params(&points, 60.0).0, 1.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
