pub mod axis;
pub mod charts;
pub mod palette;
pub mod table;

pub use axis::{format_count_tick, y_axis_domain};
pub use charts::{build_charts, BarSeries, ChartBundle, SliceSeries, TrendChart, TrendSeries};
pub use palette::class_color;
pub use table::DetectionTable;

/// Common error type for the CSV-to-chart pipeline.
///
/// A failure here flags the affected chart and leaves the rest of the
/// dashboard alone; it is never fatal.
#[derive(thiserror::Error, Debug)]
pub enum AnalyticsError {
    #[error("csv read failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("detection table has no header row")]
    MissingHeader,
    #[error("detection table has no class columns")]
    NoClasses,
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
