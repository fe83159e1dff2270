use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::core::command::ToolCommand;
use crate::core::config::Config;
use crate::core::error::BoardflowError;
use crate::core::event::{events_for_line, StreamKind, ToolEvent};
use crate::core::job::Job;
use crate::core::spawn_error;

/// Spawns the tool and streams classified events from a background thread.
/// The channel ends with `Exited` once the process has been reaped.
pub fn run_with_events(
    config: &Config,
    command: &ToolCommand,
) -> Result<Receiver<ToolEvent>, BoardflowError> {
    run_args_with_events(config.tool(), command.to_args())
}

pub fn run_args_with_events(
    binary: &Path,
    args: Vec<String>,
) -> Result<Receiver<ToolEvent>, BoardflowError> {
    tracing::debug!(binary = %binary.display(), ?args, "spawning streamed tool run");

    let mut cmd = Command::new(binary);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| spawn_error(binary, e))?;

    let (event_tx, event_rx) = mpsc::channel::<ToolEvent>();
    let (line_tx, line_rx) = mpsc::channel::<(StreamKind, String)>();
    let mut handles = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        handles.push(spawn_line_reader(StreamKind::Stdout, stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        handles.push(spawn_line_reader(StreamKind::Stderr, stderr, line_tx.clone()));
    }
    drop(line_tx);

    thread::spawn(move || {
        for (stream, line) in line_rx {
            for event in events_for_line(stream, line) {
                let _ = event_tx.send(event);
            }
        }

        for handle in handles {
            let _ = handle.join();
        }

        match child.wait() {
            Ok(status) => {
                tracing::debug!(%status, "streamed tool run exited");
                let _ = event_tx.send(ToolEvent::Exited(status.code()));
            }
            Err(err) => {
                let _ = event_tx.send(ToolEvent::Error(err.to_string()));
                let _ = event_tx.send(ToolEvent::Exited(None));
            }
        }
    });

    Ok(event_rx)
}

/// Blocking wrapper over [`run_with_events`]: hands every event to `on_event`
/// and turns a non-zero exit into `ExternalTool` carrying the stderr text.
pub fn run_streaming<F>(
    config: &Config,
    command: &ToolCommand,
    mut on_event: F,
) -> Result<Job, BoardflowError>
where
    F: FnMut(&ToolEvent),
{
    let mut job = Job::new(command.label());
    job.start();
    tracing::info!(job = job.label, tool = %config.tool().display(), "starting");

    let events = match run_with_events(config, command) {
        Ok(events) => events,
        Err(err) => {
            job.finish(false);
            return Err(err);
        }
    };

    let mut stderr = String::new();
    let mut exit_code = None;

    for event in events {
        on_event(&event);
        match &event {
            ToolEvent::Line(StreamKind::Stderr, line) => {
                stderr.push_str(line);
                stderr.push('\n');
            }
            ToolEvent::Exited(code) => {
                exit_code = *code;
            }
            _ => {}
        }
    }

    let success = exit_code == Some(0);
    job.finish(success);
    tracing::info!(job = job.label, status = ?job.status, elapsed = ?job.elapsed(), "finished");

    if success {
        Ok(job)
    } else {
        Err(BoardflowError::ExternalTool { exit_code, stderr })
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(
    stream: StreamKind,
    reader: R,
    sender: Sender<(StreamKind, String)>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut line_buf: Vec<u8> = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match reader.read(&mut byte) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }

            match byte[0] {
                b'\r' | b'\n' => {
                    if line_buf.is_empty() {
                        continue;
                    }
                    let line = String::from_utf8_lossy(&line_buf).trim_end().to_string();
                    line_buf.clear();
                    if !line.is_empty() {
                        let _ = sender.send((stream, line));
                    }
                }
                other => {
                    line_buf.push(other);
                }
            }
        }

        if !line_buf.is_empty() {
            let line = String::from_utf8_lossy(&line_buf).trim_end().to_string();
            if !line.is_empty() {
                let _ = sender.send((stream, line));
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::test_support::fake_tool;
    use std::path::PathBuf;

    fn compile() -> ToolCommand {
        ToolCommand::Compile {
            sketch: PathBuf::from("Blink"),
            fqbn: "arduino:avr:uno".to_string(),
            verbose: true,
        }
    }

    #[test]
    fn streams_lines_and_usage_then_exit() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            dir.path(),
            "echo 'Compiling sketch...'\n\
             echo 'Sketch uses 924 bytes (2%) of program storage space. Maximum is 32256 bytes.'\n\
             exit 0",
        );
        let config = Config::new(tool, dir.path().join("boards.json"));

        let mut events = Vec::new();
        let job = run_streaming(&config, &compile(), |event| events.push(event.clone())).unwrap();

        assert_eq!(job.status, crate::core::job::JobStatus::Finished);
        assert!(events.contains(&ToolEvent::Line(
            StreamKind::Stdout,
            "Compiling sketch...".to_string()
        )));
        assert!(events.iter().any(|e| matches!(e, ToolEvent::Usage(_))));
        assert_eq!(events.last(), Some(&ToolEvent::Exited(Some(0))));
    }

    #[test]
    fn carriage_returns_split_progress_samples() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            dir.path(),
            "printf 'Writing | ##   | 50%% 0.10s\\rWriting | #### | 100%% 0.20s\\n' >&2\nexit 0",
        );
        let config = Config::new(tool, dir.path().join("boards.json"));

        let mut percents = Vec::new();
        run_streaming(&config, &compile(), |event| {
            if let ToolEvent::Progress(progress) = event {
                percents.push(progress.percent);
            }
        })
        .unwrap();

        assert_eq!(percents, vec![50, 100]);
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "echo 'Error during build: exit status 1' >&2\nexit 1");
        let config = Config::new(tool, dir.path().join("boards.json"));

        let err = run_streaming(&config, &compile(), |_| {}).unwrap_err();
        match err {
            BoardflowError::ExternalTool { exit_code, stderr } => {
                assert_eq!(exit_code, Some(1));
                assert!(stderr.contains("Error during build"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("no-such-tool"), dir.path().join("boards.json"));
        let err = run_streaming(&config, &compile(), |_| {}).unwrap_err();
        assert!(matches!(err, BoardflowError::BinaryNotFound { .. }));
    }
}
