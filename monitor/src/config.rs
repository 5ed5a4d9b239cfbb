use anyhow::Context;
use roadcore::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Client-side settings: backend address, polling cadences, and the
/// defaults used when the user has not chosen a category or position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub base_url: String,
    pub kpi_interval_secs: u64,
    pub gps_interval_secs: u64,
    pub location_refresh_chance: f64,
    pub default_category: String,
    pub default_lat: f64,
    pub default_lng: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            kpi_interval_secs: 10,
            gps_interval_secs: 5,
            location_refresh_chance: 0.2,
            default_category: "Saferoute AI".to_string(),
            // Delhi, the deployment's default map center.
            default_lat: 28.6139,
            default_lng: 77.2090,
        }
    }
}

impl MonitorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading monitor config {}", path_ref.display()))?;
        let config: MonitorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing monitor config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            kpi_interval: Duration::from_secs(self.kpi_interval_secs),
            gps_interval: Duration::from_secs(self.gps_interval_secs),
            location_refresh_chance: self.location_refresh_chance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_produce_the_documented_cadences() {
        let cfg = MonitorConfig::default();
        let service = cfg.service_config();
        assert_eq!(service.kpi_interval, Duration::from_secs(10));
        assert_eq!(service.gps_interval, Duration::from_secs(5));
    }

    #[test]
    fn config_load_reads_yaml_with_defaults_for_missing_fields() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"base_url: http://10.0.0.2:9000\nkpi_interval_secs: 30\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = MonitorConfig::load(&path).unwrap();
        assert_eq!(cfg.base_url, "http://10.0.0.2:9000");
        assert_eq!(cfg.kpi_interval_secs, 30);
        assert_eq!(cfg.gps_interval_secs, 5);
    }
}
