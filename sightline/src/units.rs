use clap::ValueEnum;

const FEET_PER_METER: f64 = 3.280_839_895;
const METERS_PER_MILE: f64 = 1_609.344;

/// Unit system for human readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Ground distance, switching to km/mi for long paths.
    pub fn distance(self, meters: f64) -> String {
        match self {
            Units::Metric if meters.abs() < 1_000.0 => format!("{meters:.0} m"),
            Units::Metric => format!("{:.2} km", meters / 1_000.0),
            Units::Imperial if meters.abs() < METERS_PER_MILE => {
                format!("{:.0} ft", meters * FEET_PER_METER)
            }
            Units::Imperial => format!("{:.2} mi", meters / METERS_PER_MILE),
        }
    }

    pub fn height(self, meters: f64) -> String {
        match self {
            Units::Metric => format!("{meters:.1} m"),
            Units::Imperial => format!("{:.1} ft", meters * FEET_PER_METER),
        }
    }
}

pub fn angle(deg: f64) -> String {
    format!("{deg:.1}°")
}

/// Formats an optional value, or a dash when it is absent.
pub fn or_dash(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "-".to_owned(), fmt)
}

#[cfg(test)]
mod tests {
    use super::{angle, or_dash, Units};

    #[test]
    fn test_metric() {
        assert_eq!(Units::Metric.distance(850.4), "850 m");
        assert_eq!(Units::Metric.distance(12_360.0), "12.36 km");
        assert_eq!(Units::Metric.height(-3.26), "-3.3 m");
    }

    #[test]
    fn test_imperial() {
        assert_eq!(Units::Imperial.distance(100.0), "328 ft");
        assert_eq!(Units::Imperial.distance(3_218.688), "2.00 mi");
        assert_eq!(Units::Imperial.height(10.0), "32.8 ft");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(angle(12.345), "12.3°");
        assert_eq!(or_dash(None, angle), "-");
        assert_eq!(or_dash(Some(1.0), |m| Units::Metric.height(m)), "1.0 m");
    }
}
