//! Quantities computed from raw device state rather than stored.

use crate::device::Heater;
use crate::error::{DeviceError, DeviceResult};

/// Heater output as a percentage of the selected range: `100 * current / range`.
///
/// The range is independently settable and may pass through zero, so it is
/// checked on every call.
pub fn heater_percent_power(heater: &Heater) -> DeviceResult<f64> {
    if heater.range == 0.0 {
        return Err(DeviceError::DivisionByZero);
    }
    Ok(100.0 * heater.current / heater.range)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEATER_RANGE_TEST_VALUES: [f64; 3] = [0.001, 0.316, 1000.0];

    fn heater(range: f64, current: f64) -> Heater {
        Heater {
            range,
            current,
            ..Default::default()
        }
    }

    #[test]
    fn percent_power_matches_formula() {
        for range in HEATER_RANGE_TEST_VALUES {
            for current in HEATER_RANGE_TEST_VALUES {
                let percent = heater_percent_power(&heater(range, current)).unwrap();
                assert!((percent - 100.0 * current / range).abs() < 0.05);
            }
        }
    }

    #[test]
    fn zero_range_is_reported_not_computed() {
        assert_eq!(
            heater_percent_power(&heater(0.0, 1.0)),
            Err(DeviceError::DivisionByZero)
        );
        assert_eq!(
            heater_percent_power(&heater(-0.0, 0.0)),
            Err(DeviceError::DivisionByZero)
        );
    }

    #[test]
    fn range_passing_through_zero_recovers() {
        let mut h = heater(0.316, 0.316);
        assert!((heater_percent_power(&h).unwrap() - 100.0).abs() < 1e-9);
        h.range = 0.0;
        assert!(heater_percent_power(&h).is_err());
        h.range = 1000.0;
        assert!((heater_percent_power(&h).unwrap() - 0.0316).abs() < 1e-12);
    }
}
