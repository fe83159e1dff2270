use crate::core::progress::{parse_progress_line, UploadProgress};
use crate::core::summary::{parse_usage_line, MemoryUsage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogLevel {
    Progress,
    Usage,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    Line(StreamKind, String),
    Progress(UploadProgress),
    Usage(MemoryUsage),
    Error(String),
    Exited(Option<i32>),
}

pub fn classify_log_line(line: &str) -> LogLevel {
    let trimmed = line.trim();

    if parse_progress_line(trimmed).is_some() {
        return LogLevel::Progress;
    }
    if parse_usage_line(trimmed).is_some() {
        return LogLevel::Usage;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.contains("error:")
        || lower.starts_with("error ")
        || lower.contains("not in sync")
        || lower.contains("no such file")
    {
        return LogLevel::Error;
    }
    if lower.contains("warning:") {
        return LogLevel::Warning;
    }

    LogLevel::Info
}

/// Turns one output line into the events the session view cares about. The raw
/// line is always emitted first so nothing is hidden from the operator.
pub fn events_for_line(stream: StreamKind, line: String) -> Vec<ToolEvent> {
    let mut events = Vec::with_capacity(2);

    match classify_log_line(&line) {
        LogLevel::Progress => {
            if let Some(progress) = parse_progress_line(&line) {
                events.push(ToolEvent::Progress(progress));
            }
            return events;
        }
        LogLevel::Usage => {
            let usage = parse_usage_line(&line);
            events.push(ToolEvent::Line(stream, line));
            if let Some(usage) = usage {
                events.push(ToolEvent::Usage(usage));
            }
        }
        LogLevel::Error => {
            events.push(ToolEvent::Line(stream, line.clone()));
            events.push(ToolEvent::Error(line));
        }
        LogLevel::Warning | LogLevel::Info => {
            events.push(ToolEvent::Line(stream, line));
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_errors_are_errors() {
        let line = "/tmp/Blink/Blink.ino:5:3: error: 'pinMod' was not declared in this scope";
        assert_eq!(classify_log_line(line), LogLevel::Error);
        assert_eq!(
            classify_log_line("avrdude: stk500_recv(): programmer is not responding"),
            LogLevel::Info
        );
        assert_eq!(
            classify_log_line("avrdude: stk500_getsync() attempt 1 of 10: not in sync: resp=0x00"),
            LogLevel::Error
        );
    }

    #[test]
    fn warnings_and_reports_are_recognised() {
        assert_eq!(
            classify_log_line("Blink.ino:3:7: warning: unused variable 'x'"),
            LogLevel::Warning
        );
        let usage = "Sketch uses 924 bytes (2%) of program storage space. Maximum is 32256 bytes.";
        assert_eq!(classify_log_line(usage), LogLevel::Usage);
        assert_eq!(
            classify_log_line("Writing | ######## | 16% 0.03s"),
            LogLevel::Progress
        );
    }

    #[test]
    fn progress_lines_do_not_echo_raw_text() {
        let events = events_for_line(StreamKind::Stderr, "Writing | #### | 8% 0.01s".to_string());
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ToolEvent::Progress(_)));
    }

    #[test]
    fn error_lines_keep_raw_text_and_flag_error() {
        let line = "Error during build: exit status 1".to_string();
        let events = events_for_line(StreamKind::Stderr, line.clone());
        assert_eq!(
            events,
            vec![
                ToolEvent::Line(StreamKind::Stderr, line.clone()),
                ToolEvent::Error(line),
            ]
        );
    }
}
