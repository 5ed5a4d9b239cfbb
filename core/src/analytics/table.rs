use crate::analytics::{AnalyticsError, AnalyticsResult};

/// Per-frame cumulative detection counts parsed from the backend CSV export.
///
/// The header row carries the class names; the frame-index column is kept
/// separately. The last row is the authoritative cumulative total per class.
#[derive(Debug, Clone)]
pub struct DetectionTable {
    classes: Vec<String>,
    frames: Vec<u64>,
    rows: Vec<Vec<u64>>,
}

impl DetectionTable {
    /// Parses delimited text with a header row. Non-numeric cells degrade
    /// to zero rather than failing the whole table.
    pub fn parse(text: &str) -> AnalyticsResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|_| AnalyticsError::MissingHeader)?
            .clone();

        let mut frame_column = None;
        let mut classes = Vec::new();
        let mut class_columns = Vec::new();
        for (idx, name) in headers.iter().enumerate() {
            let trimmed = name.trim();
            if trimmed.eq_ignore_ascii_case("frame") {
                frame_column = Some(idx);
            } else if !trimmed.is_empty() {
                classes.push(trimmed.to_string());
                class_columns.push(idx);
            }
        }
        if classes.is_empty() {
            return Err(AnalyticsError::NoClasses);
        }

        let mut frames = Vec::new();
        let mut rows = Vec::new();
        for (row_index, record) in reader.records().enumerate() {
            let record = record?;
            let frame = frame_column
                .and_then(|idx| record.get(idx))
                .and_then(|cell| cell.trim().parse::<u64>().ok())
                .unwrap_or(row_index as u64);
            let counts = class_columns
                .iter()
                .map(|&idx| {
                    record
                        .get(idx)
                        .and_then(|cell| cell.trim().parse::<u64>().ok())
                        .unwrap_or(0)
                })
                .collect();
            frames.push(frame);
            rows.push(counts);
        }

        Ok(Self {
            classes,
            frames,
            rows,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn frames(&self) -> &[u64] {
        &self.frames
    }

    pub fn row(&self, index: usize) -> Option<&[u64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Final cumulative count per class, taken from the last row.
    pub fn final_counts(&self) -> Vec<(String, u64)> {
        let Some(last) = self.rows.last() else {
            return Vec::new();
        };
        self.classes
            .iter()
            .cloned()
            .zip(last.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Frame,Pothole,Debris\n1,0,1\n2,3,1\n3,12,4\n";

    #[test]
    fn parse_excludes_frame_column_from_classes() {
        let table = DetectionTable::parse(SAMPLE).unwrap();
        assert_eq!(table.classes(), &["Pothole", "Debris"]);
        assert_eq!(table.frames(), &[1, 2, 3]);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn final_counts_come_from_last_row() {
        let table = DetectionTable::parse(SAMPLE).unwrap();
        let counts = table.final_counts();
        assert_eq!(counts[0], ("Pothole".to_string(), 12));
        assert_eq!(counts[1], ("Debris".to_string(), 4));
    }

    #[test]
    fn non_numeric_cells_degrade_to_zero() {
        let table = DetectionTable::parse("Frame,Pothole\n1,n/a\n2,7\n").unwrap();
        assert_eq!(table.row(0).unwrap(), &[0]);
        assert_eq!(table.row(1).unwrap(), &[7]);
    }

    #[test]
    fn table_without_class_columns_is_rejected() {
        assert!(matches!(
            DetectionTable::parse("Frame\n1\n"),
            Err(AnalyticsError::NoClasses)
        ));
    }

    #[test]
    fn header_only_input_yields_empty_table() {
        let table = DetectionTable::parse("Frame,Pothole\n").unwrap();
        assert!(table.is_empty());
        assert!(table.final_counts().is_empty());
    }
}
