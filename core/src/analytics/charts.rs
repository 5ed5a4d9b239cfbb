use crate::analytics::palette::class_color;
use crate::analytics::table::DetectionTable;

/// Rows kept in the downsampled trend, excluding the always-appended final row.
const TREND_TARGET_POINTS: usize = 50;

/// Classes drawn in the multi-line trend chart.
const TREND_TOP_CLASSES: usize = 3;

/// Classes shown in the donut breakdown.
const DONUT_TOP_CLASSES: usize = 5;

/// Cumulative counts per class, sorted descending.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    pub categories: Vec<String>,
    pub values: Vec<u64>,
}

/// Percentage-style breakdown (pie/donut) of non-zero classes.
#[derive(Debug, Clone, Default)]
pub struct SliceSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub colors: Vec<&'static str>,
}

/// One class's sampled cumulative counts across frames.
#[derive(Debug, Clone)]
pub struct TrendSeries {
    pub name: String,
    pub points: Vec<u64>,
}

/// Downsampled multi-line trend of the top classes.
#[derive(Debug, Clone, Default)]
pub struct TrendChart {
    pub frames: Vec<u64>,
    pub series: Vec<TrendSeries>,
}

/// Everything the analytics dashboard renders from one CSV fetch.
#[derive(Debug, Clone, Default)]
pub struct ChartBundle {
    pub bar: BarSeries,
    pub pie: SliceSeries,
    pub donut: SliceSeries,
    pub trend: TrendChart,
}

/// Turns a parsed detection table into the chart-ready shapes.
///
/// An empty table yields empty series rather than an error so the page can
/// render its placeholders.
pub fn build_charts(table: &DetectionTable) -> ChartBundle {
    let mut ranked = table.final_counts();
    if ranked.is_empty() {
        return ChartBundle::default();
    }
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let bar = BarSeries {
        categories: ranked.iter().map(|(name, _)| name.clone()).collect(),
        values: ranked.iter().map(|(_, value)| *value).collect(),
    };

    let non_zero: Vec<&(String, u64)> = ranked.iter().filter(|(_, value)| *value > 0).collect();
    let pie = slice_series(&non_zero);
    let donut = slice_series(&non_zero[..non_zero.len().min(DONUT_TOP_CLASSES)]);
    let trend = trend_chart(table, &ranked);

    ChartBundle {
        bar,
        pie,
        donut,
        trend,
    }
}

fn slice_series(entries: &[&(String, u64)]) -> SliceSeries {
    SliceSeries {
        labels: entries.iter().map(|(name, _)| name.clone()).collect(),
        values: entries.iter().map(|(_, value)| *value).collect(),
        colors: entries
            .iter()
            .enumerate()
            .map(|(index, (name, _))| class_color(name, index))
            .collect(),
    }
}

/// Downsamples to roughly `TREND_TARGET_POINTS` rows by stride, always
/// keeping the final row so the latest state survives the cut.
fn sampled_indices(row_count: usize) -> Vec<usize> {
    let stride = (row_count / TREND_TARGET_POINTS).max(1);
    (0..row_count)
        .filter(|index| index % stride == 0 || *index == row_count - 1)
        .collect()
}

fn trend_chart(table: &DetectionTable, ranked: &[(String, u64)]) -> TrendChart {
    let indices = sampled_indices(table.row_count());
    let frames = indices
        .iter()
        .filter_map(|&index| table.frames().get(index).copied())
        .collect();

    let series = ranked
        .iter()
        .take(TREND_TOP_CLASSES)
        .map(|(name, _)| {
            let column = table
                .classes()
                .iter()
                .position(|class| class == name)
                .unwrap_or(0);
            let points = indices
                .iter()
                .filter_map(|&index| table.row(index).and_then(|row| row.get(column).copied()))
                .collect();
            TrendSeries {
                name: name.clone(),
                points,
            }
        })
        .collect();

    TrendChart { frames, series }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> DetectionTable {
        DetectionTable::parse(text).unwrap()
    }

    #[test]
    fn bar_series_sorts_descending_by_final_count() {
        let bundle = build_charts(&table(
            "Frame,Debris,Pothole,Manhole\n1,1,5,0\n2,4,12,0\n",
        ));
        assert_eq!(bundle.bar.categories, vec!["Pothole", "Debris", "Manhole"]);
        assert_eq!(bundle.bar.values, vec![12, 4, 0]);
    }

    #[test]
    fn pie_excludes_zero_count_classes() {
        let bundle = build_charts(&table(
            "Frame,Debris,Pothole,Manhole\n1,1,5,0\n2,4,12,0\n",
        ));
        assert_eq!(bundle.pie.labels, vec!["Pothole", "Debris"]);
        assert!(!bundle.pie.labels.contains(&"Manhole".to_string()));
        assert_eq!(bundle.pie.colors.len(), 2);
    }

    #[test]
    fn donut_takes_at_most_top_five() {
        let bundle = build_charts(&table(
            "Frame,A,B,C,D,E,F,G\n1,7,6,5,4,3,2,1\n",
        ));
        assert_eq!(bundle.donut.labels, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn trend_tracks_top_three_classes() {
        let bundle = build_charts(&table(
            "Frame,Debris,Pothole,Manhole,Patches\n1,1,5,2,0\n2,4,12,3,0\n",
        ));
        let names: Vec<&str> = bundle.trend.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Pothole", "Debris", "Manhole"]);
        assert_eq!(bundle.trend.series[0].points, vec![5, 12]);
    }

    #[test]
    fn trend_downsamples_long_sessions_and_keeps_last_frame() {
        let mut text = String::from("Frame,Pothole\n");
        for frame in 0..500u64 {
            text.push_str(&format!("{},{}\n", frame, frame / 10));
        }
        let bundle = build_charts(&table(&text));
        assert!(bundle.trend.frames.len() <= 51);
        assert_eq!(bundle.trend.frames.last().copied(), Some(499));
        assert_eq!(
            bundle.trend.series[0].points.len(),
            bundle.trend.frames.len()
        );
    }

    #[test]
    fn empty_table_yields_empty_bundle() {
        let bundle = build_charts(&table("Frame,Pothole\n"));
        assert!(bundle.bar.categories.is_empty());
        assert!(bundle.pie.labels.is_empty());
        assert!(bundle.trend.frames.is_empty());
    }
}
