/// Formats a count tick for display, collapsing thousands to a `k` suffix.
pub fn format_count_tick(value: u64) -> String {
    if value >= 1000 {
        format!("{}k", (value as f64 / 1000.0).round() as u64)
    } else {
        value.to_string()
    }
}

/// Y-axis domain for the trend charts: pads the peak by 10% and rounds up
/// to a tick interval sized for the magnitude of the data.
pub fn y_axis_domain(max_value: u64) -> (u64, u64) {
    if max_value == 0 {
        return (0, 10);
    }

    let padded = (max_value as f64 * 1.1).ceil() as u64;
    let tick_interval = if padded <= 10 {
        2
    } else if padded <= 50 {
        10
    } else if padded <= 100 {
        20
    } else if padded <= 500 {
        50
    } else if padded <= 1000 {
        100
    } else {
        ((padded as f64 / 10.0 / 100.0).ceil() as u64) * 100
    };

    let adjusted = padded.div_ceil(tick_interval) * tick_interval;
    (0, adjusted)
}
