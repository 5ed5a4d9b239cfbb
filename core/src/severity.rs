//! Severity classification shared by the dashboard and report output.

/// Density (potholes per km) boundaries used by the classification bands.
pub const SEVERITY_HIGH: f64 = 30.0;
pub const SEVERITY_MEDIUM: f64 = 10.0;
pub const SEVERITY_LOW: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityClass {
    High,
    Medium,
    Low,
    VeryLow,
}

impl SeverityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityClass::High => "high",
            SeverityClass::Medium => "medium",
            SeverityClass::Low => "low",
            SeverityClass::VeryLow => "very-low",
        }
    }
}

/// Classifies a numeric severity score into a display band.
pub fn severity_class(value: f64) -> SeverityClass {
    if value > SEVERITY_HIGH {
        SeverityClass::High
    } else if value > SEVERITY_MEDIUM {
        SeverityClass::Medium
    } else if value >= SEVERITY_LOW {
        SeverityClass::Low
    } else {
        SeverityClass::VeryLow
    }
}

/// Color for a backend-reported severity level string.
pub fn severity_color_for_level(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "critical" => "#dc3545",
        "high" => "#fd7e14",
        "medium" => "#ffc107",
        _ => "#28a745",
    }
}

/// Color for a raw potholes-per-km density.
pub fn severity_color_for_density(per_km: f64) -> &'static str {
    if per_km > 7.0 {
        "#dc3545"
    } else if per_km > 5.0 {
        "#fd7e14"
    } else if per_km > 2.0 {
        "#ffc107"
    } else {
        "#28a745"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_bands_are_inclusive_at_low_edge() {
        assert_eq!(severity_class(31.0), SeverityClass::High);
        assert_eq!(severity_class(30.0), SeverityClass::Medium);
        assert_eq!(severity_class(10.5), SeverityClass::Medium);
        assert_eq!(severity_class(1.0), SeverityClass::Low);
        assert_eq!(severity_class(0.5), SeverityClass::VeryLow);
    }

    #[test]
    fn level_colors_are_case_insensitive() {
        assert_eq!(severity_color_for_level("Critical"), "#dc3545");
        assert_eq!(severity_color_for_level("LOW"), "#28a745");
        assert_eq!(severity_color_for_level("unknown"), "#28a745");
    }

    #[test]
    fn density_colors_follow_per_km_bands() {
        assert_eq!(severity_color_for_density(8.0), "#dc3545");
        assert_eq!(severity_color_for_density(6.0), "#fd7e14");
        assert_eq!(severity_color_for_density(3.0), "#ffc107");
        assert_eq!(severity_color_for_density(1.0), "#28a745");
    }
}
