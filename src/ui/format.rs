//! Display formatting for storage figures.

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Formats a byte count in 1024-based units with at most two decimals.
///
/// Trailing zeros are dropped: `1536` is `"1.5 KB"`, `2 << 30` is `"2 GB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Usage as a percentage of quota with one decimal, or `"N/A"` when the
/// quota is unknown.
pub fn format_percent(used: u64, quota: u64) -> String {
    if quota == 0 {
        return "N/A".to_string();
    }
    format!("{:.1}%", used as f64 / quota as f64 * 100.0)
}
