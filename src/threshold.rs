//! Stateless threshold rules over a single sample.

use crate::alert::Alert;
use crate::frame::VitalsSample;

/// Per-session limits. Read-only for the session's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub heart_rate_min: u8,
    pub heart_rate_max: u8,
    pub oxygen_min: u8,
}

/// Maps one sample to zero, one or two alerts.
///
/// Rule order is fixed: the heart rate check runs first (high wins over
/// low, never both for one sample), then the oxygen check. Boundary
/// values equal to a limit are in range.
pub fn evaluate(sample: &VitalsSample, thresholds: &Thresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if sample.heart_rate_bpm > thresholds.heart_rate_max {
        alerts.push(Alert::high_heart_rate(sample.heart_rate_bpm));
    } else if sample.heart_rate_bpm < thresholds.heart_rate_min {
        alerts.push(Alert::low_heart_rate(sample.heart_rate_bpm));
    }
    if sample.oxygen_pct < thresholds.oxygen_min {
        alerts.push(Alert::low_oxygen(sample.oxygen_pct));
    }
    alerts
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::alert::AlertKind;

    const THRESHOLDS: Thresholds = Thresholds {
        heart_rate_min: 60,
        heart_rate_max: 100,
        oxygen_min: 90,
    };

    fn sample(heart_rate_bpm: u8, oxygen_pct: u8) -> VitalsSample {
        VitalsSample {
            heart_rate_bpm,
            oxygen_pct,
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn in_range_sample_raises_nothing() {
        assert!(evaluate(&sample(72, 98), &THRESHOLDS).is_empty());
    }

    #[test]
    fn boundary_values_are_in_range() {
        assert!(evaluate(&sample(60, 90), &THRESHOLDS).is_empty());
        assert!(evaluate(&sample(100, 90), &THRESHOLDS).is_empty());
    }

    #[test]
    fn high_heart_rate_alone() {
        let alerts = evaluate(&sample(120, 95), &THRESHOLDS);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::HighHeartRate);
        assert_eq!(alerts[0].value, 120);
    }

    #[test]
    fn low_heart_rate_and_low_oxygen_in_order() {
        let alerts = evaluate(&sample(50, 85), &THRESHOLDS);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::LowHeartRate);
        assert_eq!(alerts[0].value, 50);
        assert_eq!(alerts[1].kind, AlertKind::LowOxygen);
        assert_eq!(alerts[1].value, 85);
    }

    #[test]
    fn heart_rate_never_fires_both_rules() {
        // min > max is a degenerate config; high still wins.
        let inverted = Thresholds {
            heart_rate_min: 100,
            heart_rate_max: 60,
            oxygen_min: 0,
        };
        let alerts = evaluate(&sample(80, 99), &inverted);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::HighHeartRate);
    }
}
