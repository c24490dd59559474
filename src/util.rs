//! Small formatting helpers shared by the exporter and the CLI.

use std::time::Duration;

/// Longest file stem produced by [`sanitize_filename`], in characters.
pub const MAX_FILENAME_CHARS: usize = 200;

/// Makes a string safe to use as a single path segment.
///
/// Reserved and control characters become `_`, leading and trailing dots and
/// spaces are removed, and the result is capped at [`MAX_FILENAME_CHARS`].
/// Never returns an empty string.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed: String = mapped
        .trim_matches(|c| c == '.' || c == ' ')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();

    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed
    }
}

/// Formats a duration as seconds, minutes or hours with one decimal.
///
/// ```
/// use std::time::Duration;
/// use fetchline_core::util::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(42)), "42.0 seconds");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1.5 minutes");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1.5 hours");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if seconds < 60.0 {
        format!("{seconds:.1} seconds")
    } else if seconds < 3600.0 {
        format!("{:.1} minutes", seconds / 60.0)
    } else {
        format!("{:.1} hours", seconds / 3600.0)
    }
}
