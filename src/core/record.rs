//! Aggregate records emitted once per minute boundary.

use std::fmt;

/// Average delivery time of a window, tagged so that an empty or all-zero
/// window renders as the bare integer `0` while every real average keeps
/// its decimal point (`5.0`, `20.5`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageDeliveryTime {
    Zero,
    Mean(f64),
}

impl AverageDeliveryTime {
    /// Numeric value of the average.
    pub fn value(&self) -> f64 {
        match self {
            AverageDeliveryTime::Zero => 0.0,
            AverageDeliveryTime::Mean(mean) => *mean,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, AverageDeliveryTime::Zero)
    }
}

impl fmt::Display for AverageDeliveryTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AverageDeliveryTime::Zero => write!(f, "0"),
            AverageDeliveryTime::Mean(mean) => write!(f, "{}", format_real(*mean)),
        }
    }
}

/// Shortest round-trip rendering of a real number that always reads as a
/// real: whole numbers keep a trailing `.0`, and very large or very small
/// magnitudes switch to exponent form (`1e+16`, `1e-05`).
fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exponent.abs())
            }
            None => formatted,
        };
    }

    let formatted = value.to_string();
    if formatted.contains('.') {
        formatted
    } else {
        format!("{formatted}.0")
    }
}

/// One line of output: the window's right edge and its average.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    /// Right edge of the window, `YYYY-MM-DD HH:MM:SS`
    pub date: String,
    /// Average delivery time over the window
    pub average_delivery_time: AverageDeliveryTime,
}

impl AggregateRecord {
    pub fn new(date: impl Into<String>, average_delivery_time: AverageDeliveryTime) -> Self {
        Self {
            date: date.into(),
            average_delivery_time,
        }
    }
}

impl fmt::Display for AggregateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"date\":\"{}\", \"average_delivery_time\":{}}}",
            self.date, self.average_delivery_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_renders_as_integer() {
        assert_eq!(AverageDeliveryTime::Zero.to_string(), "0");
        assert_eq!(AverageDeliveryTime::Mean(0.0).to_string(), "0.0");
    }

    #[test]
    fn test_mean_renders_as_real() {
        assert_eq!(AverageDeliveryTime::Mean(20.0).to_string(), "20.0");
        assert_eq!(AverageDeliveryTime::Mean(25.5).to_string(), "25.5");
        assert_eq!(
            AverageDeliveryTime::Mean(1.0 / 3.0).to_string(),
            "0.3333333333333333"
        );
        assert_eq!(
            AverageDeliveryTime::Mean(1e15).to_string(),
            "1000000000000000.0"
        );
    }

    #[test]
    fn test_extreme_magnitudes_use_exponent_form() {
        assert_eq!(AverageDeliveryTime::Mean(1e16).to_string(), "1e+16");
        assert_eq!(AverageDeliveryTime::Mean(2.5e-5).to_string(), "2.5e-05");
        assert_eq!(AverageDeliveryTime::Mean(1e-4).to_string(), "0.0001");
    }

    #[test]
    fn test_record_wire_format() {
        let record = AggregateRecord::new("2018-12-26 18:11:00", AverageDeliveryTime::Zero);
        assert_eq!(
            record.to_string(),
            r#"{"date":"2018-12-26 18:11:00", "average_delivery_time":0}"#
        );

        let record = AggregateRecord::new("2018-12-26 18:12:00", AverageDeliveryTime::Mean(20.0));
        let parsed: serde_json::Value = serde_json::from_str(&record.to_string()).unwrap();
        assert_eq!(parsed["date"], "2018-12-26 18:12:00");
        assert_eq!(parsed["average_delivery_time"].as_f64(), Some(20.0));
    }
}
