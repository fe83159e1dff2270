use std::time::Duration;

use crate::core::board::BoardRecord;
use crate::core::editor::InstalledEditor;
use crate::core::progress::UploadProgress;
use crate::core::summary::{MemoryRegion, MemoryUsage};

pub const NO_MATCHES: &str = "No matching boards found.";

pub fn format_board_line(board: &BoardRecord) -> String {
    format!("- {} ({})", board.name, board.identifier)
}

/// Lines printed for an interactive search.
pub fn format_search_results(boards: &[BoardRecord]) -> Vec<String> {
    if boards.is_empty() {
        return vec![NO_MATCHES.to_string()];
    }
    boards.iter().map(format_board_line).collect()
}

pub fn format_editor_line(index: usize, editor: &InstalledEditor) -> String {
    format!("{}. {} ({})", index + 1, editor.name, editor.command)
}

pub fn format_usage_line(usage: &MemoryUsage) -> String {
    let region = match usage.region {
        MemoryRegion::Program => "flash",
        MemoryRegion::Dynamic => "ram  ",
    };
    let used = format_bytes(usage.used_bytes);
    match (usage.maximum_bytes, usage.percent) {
        (Some(max), Some(percent)) => {
            format!("Usage  : {region} {used} / {} ({percent}%)", format_bytes(max))
        }
        (Some(max), None) => format!("Usage  : {region} {used} / {}", format_bytes(max)),
        _ => format!("Usage  : {region} {used}"),
    }
}

pub fn format_progress_line(progress: &UploadProgress) -> String {
    let elapsed = progress
        .elapsed
        .map(format_seconds)
        .unwrap_or_else(|| "--".to_string());
    format!("progress: {} {}% ({elapsed})", progress.phase, progress.percent)
}

pub fn format_seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let value = bytes as f64;
    if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_line_matches_listing_format() {
        let board = BoardRecord::new("Arduino Uno", "arduino:avr:uno");
        assert_eq!(format_board_line(&board), "- Arduino Uno (arduino:avr:uno)");
    }

    #[test]
    fn empty_results_print_notice() {
        assert_eq!(format_search_results(&[]), vec![NO_MATCHES.to_string()]);
    }

    #[test]
    fn usage_line_includes_maximum_when_known() {
        let usage = MemoryUsage {
            region: MemoryRegion::Program,
            used_bytes: 924,
            percent: Some(2),
            maximum_bytes: Some(32256),
        };
        assert_eq!(format_usage_line(&usage), "Usage  : flash 924 B / 31.50 KB (2%)");
    }
}
