//! Display helpers shared by presentation layers.

/// `MM:SS` countdown text. Minutes are not wrapped into hours.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Human duration: `45m`, `2h`, `1h 30m`.
pub fn format_duration(minutes: u64) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}

/// Percentage of `total` already elapsed, clamped to 0..=100.
pub fn calculate_progress(remaining: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let elapsed = total as f64 - remaining as f64;
    (elapsed / total as f64 * 100.0).clamp(0.0, 100.0)
}
