use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

/// One programmer progress bar sample, e.g. `Writing | ##### | 100% 0.19s`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    pub phase: String,
    pub percent: u8,
    pub elapsed: Option<Duration>,
}

static RE_PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Reading|Writing|Erasing)\s*\|\s*#*\s*\|\s*(\d{1,3})%(?:\s+([0-9]*\.?[0-9]+)s)?")
        .unwrap()
});

pub fn parse_progress_line(line: &str) -> Option<UploadProgress> {
    let cap = RE_PROGRESS.captures(line.trim())?;
    let phase = cap.get(1)?.as_str().to_string();
    let percent = cap.get(2)?.as_str().parse::<u8>().ok()?.min(100);
    let elapsed = cap
        .get(3)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(Duration::from_secs_f64);

    Some(UploadProgress {
        phase,
        percent,
        elapsed,
    })
}
