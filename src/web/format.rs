//! Compact Hebrew availability text for the cards.
//!
//! Registration forms store days as `ראשון; שלישי; שבת` and hours as
//! `16:00-20:00 אחר הצהריים; 08:00-12:00 בוקר`. Cards show `א, ג: בוקר, אחר הצהריים`.

use std::sync::OnceLock;

use regex::Regex;

const DAY_LETTERS: [(&str, &str); 7] = [
    ("ראשון", "א"),
    ("שני", "ב"),
    ("שלישי", "ג"),
    ("רביעי", "ד"),
    ("חמישי", "ה"),
    ("שישי", "ו"),
    ("שבת", "ש"),
];

const WEEKDAY_RUNS: [(&str, &str); 6] = [
    ("א, ב, ג, ד, ה", "א-ה"),
    ("א, ב, ג, ד", "א-ד"),
    ("א, ב, ג", "א-ג"),
    ("ב, ג, ד, ה", "ב-ה"),
    ("ב, ג, ד", "ב-ד"),
    ("ג, ד, ה", "ג-ה"),
];

fn time_range() -> Option<&'static Regex> {
    static TIME_RANGE: OnceLock<Option<Regex>> = OnceLock::new();
    TIME_RANGE
        .get_or_init(|| Regex::new(r"[\d:-]+ ").ok())
        .as_ref()
}

fn daypart_rank(part: &str) -> u8 {
    match part {
        "בוקר" => 0,
        "ערב" => 2,
        _ => 1,
    }
}

/// Drops clock ranges and orders day parts morning first, evening last.
pub fn format_hour(hours: &str) -> String {
    let without_times = match time_range() {
        Some(re) => re.replace_all(hours, "").into_owned(),
        None => hours.to_string(),
    };

    let mut parts: Vec<&str> = without_times
        .split("; ")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    parts.sort_by_key(|part| daypart_rank(part));
    parts.join(", ")
}

/// Day names to their sorted one-letter forms.
pub fn format_days(days: &str) -> Vec<String> {
    let mut replaced = days.to_string();
    for (name, letter) in DAY_LETTERS {
        replaced = replaced.replacen(name, letter, 1);
    }

    let mut letters: Vec<String> = replaced
        .split("; ")
        .map(str::trim)
        .filter(|day| !day.is_empty())
        .map(str::to_string)
        .collect();
    letters.sort();
    letters
}

/// Collapses consecutive weekdays into a range (`א, ב, ג` becomes `א-ג`).
pub fn format_weekdays(weekdays: &str) -> String {
    let mut collapsed = weekdays.to_string();
    for (run, range) in WEEKDAY_RUNS {
        collapsed = collapsed.replacen(run, range, 1);
    }
    collapsed
}

fn is_weekend(day: &str) -> bool {
    day == "ו" || day == "ש"
}

/// One or two availability lines: weekdays first, then the weekend.
pub fn format_hours(days: &str, week_days_hours: &str, weekend_hours: &str) -> Vec<String> {
    let days = format_days(days);
    let weekdays_text = format_hour(week_days_hours);
    let weekend_text = format_hour(weekend_hours);

    if days.len() == 7 && weekdays_text == weekend_text {
        return vec![weekdays_text];
    }

    let (weekend, weekdays): (Vec<&String>, Vec<&String>) =
        days.iter().partition(|day| is_weekend(day));

    let mut lines = Vec::new();
    if !weekdays.is_empty() {
        let joined = weekdays.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ");
        lines.push(format!("{}: {weekdays_text}", format_weekdays(&joined)));
    }
    if !weekend.is_empty() {
        let joined = weekend.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ");
        lines.push(format!("{joined}: {weekend_text}"));
    }
    lines
}
