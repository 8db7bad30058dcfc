use chrono::{DateTime, Utc};

use super::model::GenerationStatus;

/// Number of prompt words kept in a list headline.
const HEADLINE_WORDS: usize = 4;

const AGE_UNITS: [(&str, i64); 6] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
];

/// Render the age of `timestamp` relative to `now`, e.g. `3 hours ago`.
///
/// Uses the largest whole unit; anything under a minute (or in the future)
/// is `Just now`.
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();

    for (unit, unit_seconds) in AGE_UNITS {
        let count = seconds / unit_seconds;
        if count >= 1 {
            return if count == 1 {
                format!("1 {unit} ago")
            } else {
                format!("{count} {unit}s ago")
            };
        }
    }

    "Just now".to_string()
}

/// Short headline for a prompt: its first few words, with `...` when cut.
pub fn prompt_headline(prompt: &str) -> String {
    let words: Vec<&str> = prompt.split_whitespace().collect();
    if words.len() <= HEADLINE_WORDS {
        words.join(" ")
    } else {
        format!("{}...", words[..HEADLINE_WORDS].join(" "))
    }
}

/// Text progress bar of `width` cells followed by the percentage.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 100.0)
    };
    let filled = ((progress / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "{}{} {:>3}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        progress.floor() as u32
    )
}

pub fn status_glyph(status: GenerationStatus) -> &'static str {
    match status {
        GenerationStatus::Generating => "◌",
        GenerationStatus::Completed => "✔",
        GenerationStatus::Failed => "✘",
    }
}
