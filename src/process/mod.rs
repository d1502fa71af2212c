//! External process plumbing for the export and import stages.
//!
//! Commands are built as argv vectors, never as shell strings. Every run
//! checks the exit status; stderr is captured so failures carry the tool's
//! own message.

pub mod export;
pub mod import;

pub use export::{Exporter, MysqlDumpExporter};
pub use import::{EmbeddedImporter, Importer, SqliteShellImporter, importer_for};

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::{ConvertError, Result};

/// Longest stderr excerpt kept in an error message.
const MAX_STDERR_CHARS: usize = 4096;

/// Spawn `command`, wait for it and fail on a non-zero exit.
///
/// stdin/stdout must already be configured by the caller; stderr is
/// replaced with a pipe that is drained on a helper thread.
///
/// # Errors
///
/// Returns [`ConvertError::Spawn`] if the executable cannot be started,
/// [`ConvertError::Timeout`] if it outlives `timeout`, and
/// [`ConvertError::ExternalProcess`] on an unsuccessful exit.
pub fn run_checked(mut command: Command, timeout: Option<Duration>) -> Result<()> {
    let program = command.get_program().to_string_lossy().into_owned();
    command.stderr(Stdio::piped());

    tracing::debug!(program = %program, args = ?command.get_args().collect::<Vec<_>>(), "Spawning");
    let mut child = command.spawn().map_err(|source| ConvertError::Spawn {
        program: program.clone(),
        source,
    })?;

    // Drain stderr concurrently so a chatty child cannot block on a full pipe.
    let stderr_thread = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let status = match timeout {
        Some(limit) => match child.wait_timeout(limit) {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::warn!(program = %program, "Timed out after {}s, killing", limit.as_secs());
                kill_and_reap(&mut child);
                return Err(ConvertError::Timeout {
                    program,
                    seconds: limit.as_secs(),
                });
            }
            Err(err) => {
                kill_and_reap(&mut child);
                return Err(err.into());
            }
        },
        None => child.wait()?,
    };

    let stderr = stderr_thread
        .and_then(|t| t.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default();

    check_status(&program, status, &stderr)
}

/// Kill `child` and wait for it so no zombie is left behind.
fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn check_status(program: &str, status: ExitStatus, stderr: &str) -> Result<()> {
    if status.success() {
        if !stderr.trim().is_empty() {
            tracing::info!(program = %program, "stderr: {}", stderr.trim());
        }
        return Ok(());
    }

    Err(ConvertError::ExternalProcess {
        program: program.to_string(),
        code: status.code(),
        stderr: truncate(stderr.trim(), MAX_STDERR_CHARS),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let command = Command::new("definitely-not-a-real-binary-m2s");
        let err = run_checked(command, None).unwrap_err();
        assert!(matches!(err, ConvertError::Spawn { ref program, .. } if program == "definitely-not-a-real-binary-m2s"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo 'Access denied' >&2; exit 3"]);
        let err = run_checked(command, None).unwrap_err();
        match err {
            ConvertError::ExternalProcess { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "Access denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn success_passes() {
        let mut command = Command::new("sh");
        command.args(["-c", "exit 0"]);
        run_checked(command, Some(Duration::from_secs(10))).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn kill_and_reap_leaves_no_running_child() {
        let mut child = Command::new("sh").args(["-c", "sleep 5"]).spawn().unwrap();
        kill_and_reap(&mut child);
        assert!(child.try_wait().unwrap().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn slow_process_times_out() {
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 5"]);
        let err = run_checked(command, Some(Duration::from_millis(200))).unwrap_err();
        assert!(matches!(err, ConvertError::Timeout { .. }));
    }
}
