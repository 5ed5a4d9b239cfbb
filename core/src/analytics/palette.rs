/// Fallback palette cycled for class names without a fixed color, indexed
/// by the class's position in the sorted order so re-renders stay stable.
pub const FALLBACK_COLORS: [&str; 24] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c", "#34495e", "#e67e22",
    "#95a5a6", "#f1c40f", "#16a085", "#d35400", "#8e44ad", "#c0392b", "#27ae60", "#2980b9",
    "#7f8c8d", "#d63031", "#6c5ce7", "#fd79a8", "#fdcb6e", "#a29bfe", "#6c5ce7", "#fd79a8",
];

fn fixed_color(class_name: &str) -> Option<&'static str> {
    let color = match class_name {
        "Pothole" | "pothole" => "#e74c3c",
        "Broken_guide_pole" | "broken_pole" | "Speed_bump" => "#f39c12",
        "Crack" => "#3498db",
        "Manhole" | "manhole" => "#9b59b6",
        "Road_damage" => "#2ecc71",
        "Traffic_sign" => "#f1c40f",
        "Barrier" => "#34495e",
        "Cone" => "#e67e22",
        "Debris" | "debrish" => "#95a5a6",
        "Construction" => "#16a085",
        "Warning_sign" => "#d35400",
        "Bump" => "#8e44ad",
        "Hole" => "#c0392b",
        "Obstruction" => "#27ae60",
        "Maintenance" => "#2980b9",
        "Road_block" => "#7f8c8d",
        "Construction_zone" => "#1abc9c",
        "Utility_work" => "#d63031",
        "Surface_issue" => "#6c5ce7",
        "Alligator crack" => "#FF6B6B",
        "Longitudinal crack" => "#4ECDC4",
        "Transverse crack" => "#45B7D1",
        "animal_carcasses" => "#FFA07A",
        "patches" => "#98D8C8",
        _ => return None,
    };
    Some(color)
}

/// Color for a class: the fixed assignment when the name is known, otherwise
/// a deterministic fallback keyed by position.
pub fn class_color(class_name: &str, index: usize) -> &'static str {
    fixed_color(class_name).unwrap_or(FALLBACK_COLORS[index % FALLBACK_COLORS.len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_classes_keep_their_fixed_color() {
        assert_eq!(class_color("Pothole", 9), "#e74c3c");
        assert_eq!(class_color("Debris", 0), "#95a5a6");
    }

    #[test]
    fn unknown_classes_cycle_the_fallback_palette() {
        assert_eq!(class_color("Sinkhole", 1), FALLBACK_COLORS[1]);
        assert_eq!(
            class_color("Sinkhole", FALLBACK_COLORS.len() + 1),
            FALLBACK_COLORS[1]
        );
    }
}
