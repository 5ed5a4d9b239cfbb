use anyhow::Context;
use async_trait::async_trait;
use roadcore::{GeoError, GeoFix, GeoSource};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Always reports the configured default coordinate. Used when no live GPS
/// data is available; fixes are flagged so the UI can show "GPS disabled".
pub struct FixedGeoSource {
    fix: GeoFix,
}

impl FixedGeoSource {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            fix: GeoFix {
                lat,
                lng,
                fallback: true,
            },
        }
    }
}

#[async_trait]
impl GeoSource for FixedGeoSource {
    async fn current_position(&self) -> Result<GeoFix, GeoError> {
        Ok(self.fix)
    }
}

/// Replays a recorded GPS track (one `lat,lng` pair per line), holding the
/// last point once the track is exhausted.
pub struct TrackGeoSource {
    points: Vec<(f64, f64)>,
    cursor: AtomicUsize,
}

impl TrackGeoSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading GPS track {}", path_ref.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("parsing GPS track {}", path_ref.display()))
    }

    fn parse(contents: &str) -> anyhow::Result<Self> {
        let mut points = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (lat, lng) = line
                .split_once(',')
                .with_context(|| format!("expected `lat,lng`, got `{}`", line))?;
            points.push((lat.trim().parse::<f64>()?, lng.trim().parse::<f64>()?));
        }
        anyhow::ensure!(!points.is_empty(), "track contains no points");
        Ok(Self {
            points,
            cursor: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl GeoSource for TrackGeoSource {
    async fn current_position(&self) -> Result<GeoFix, GeoError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let (lat, lng) = self.points[index.min(self.points.len() - 1)];
        Ok(GeoFix {
            lat,
            lng,
            fallback: false,
        })
    }
}

/// The geolocation source actually wired into the service: a recorded
/// track when one was provided, otherwise the configured default.
pub enum ClientGeoSource {
    Fixed(FixedGeoSource),
    Track(TrackGeoSource),
}

#[async_trait]
impl GeoSource for ClientGeoSource {
    async fn current_position(&self) -> Result<GeoFix, GeoError> {
        match self {
            ClientGeoSource::Fixed(source) => source.current_position().await,
            ClientGeoSource::Track(source) => source.current_position().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_source_flags_the_fallback() {
        let source = FixedGeoSource::new(28.6139, 77.2090);
        let fix = source.current_position().await.unwrap();
        assert!(fix.fallback);
        assert_eq!(fix.lat, 28.6139);
    }

    #[tokio::test]
    async fn track_source_replays_then_holds_the_last_point() {
        let source = TrackGeoSource::parse("# route\n12.0,75.0\n12.5,75.5\n").unwrap();
        assert_eq!(source.current_position().await.unwrap().lat, 12.0);
        assert_eq!(source.current_position().await.unwrap().lat, 12.5);
        assert_eq!(source.current_position().await.unwrap().lat, 12.5);
    }

    #[test]
    fn empty_track_is_rejected() {
        assert!(TrackGeoSource::parse("# nothing here\n").is_err());
    }
}
