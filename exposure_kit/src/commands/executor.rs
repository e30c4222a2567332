//! Whitelisted system command execution
//!
//! Only commands registered with [`CommandExecutor::allow_commands`] can be run.
//! Each call is bounded by a timeout; a child that outlives it is killed.

use std::collections::HashSet;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Flags whose value is a credential and must never reach the logs
const SECRET_FLAGS: &[&str] = &["--token", "--password"];

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Errors raised before a command produced an exit status
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("command '{0}' is not whitelisted")]
    NotAllowed(String),

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("failed waiting on '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs whitelisted commands with a default timeout
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    allowed: HashSet<String>,
    default_timeout: Duration,
}

impl CommandExecutor {
    pub fn with_timeout(default_timeout: Duration) -> Self {
        Self {
            allowed: HashSet::new(),
            default_timeout,
        }
    }

    /// Add commands to the whitelist
    pub fn allow_commands(&mut self, commands: &[&str]) {
        self.allowed
            .extend(commands.iter().map(|command| command.to_string()));
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed.contains(command)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Execute a command, waiting at most `timeout` (or the default)
    pub fn execute(
        &self,
        command: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError> {
        if !self.is_allowed(command) {
            return Err(CommandError::NotAllowed(command.to_string()));
        }

        let timeout = timeout.unwrap_or(self.default_timeout);
        log::debug!("exec: {} {}", command, redact_args(args));

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        // Drain both pipes on their own threads so a large response cannot
        // block the child while we poll for exit.
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = wait_with_deadline(&mut child, command, timeout)?;

        Ok(CommandOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
        })
    }
}

fn wait_with_deadline(
    child: &mut Child,
    command: &str,
    timeout: Duration,
) -> Result<std::process::ExitStatus, CommandError> {
    // A timeout too large to represent as an instant never expires
    let deadline = Instant::now().checked_add(timeout);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if deadline.is_some_and(|deadline| Instant::now() >= deadline) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Timeout {
                    command: command.to_string(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                return Err(CommandError::Wait {
                    command: command.to_string(),
                    source,
                })
            }
        }
    }
}

/// Join arguments for logging with credential values masked
fn redact_args(args: &[&str]) -> String {
    let mut redacted = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            redacted.push("<redacted>".to_string());
            mask_next = false;
            continue;
        }
        match arg.split_once('=') {
            Some((flag, _)) if SECRET_FLAGS.contains(&flag) => {
                redacted.push(format!("{}=<redacted>", flag));
            }
            _ => {
                mask_next = SECRET_FLAGS.contains(arg);
                redacted.push(arg.to_string());
            }
        }
    }
    redacted.join(" ")
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<thread::JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unlisted_command() {
        let executor = CommandExecutor::with_timeout(Duration::from_secs(5));
        let err = executor.execute("rm", &["-rf", "/"], None).unwrap_err();
        assert!(matches!(err, CommandError::NotAllowed(ref c) if c == "rm"));
    }

    #[test]
    fn test_allow_commands() {
        let mut executor = CommandExecutor::with_timeout(Duration::from_secs(5));
        executor.allow_commands(&["kubectl", "/usr/bin/kubectl"]);
        assert!(executor.is_allowed("kubectl"));
        assert!(executor.is_allowed("/usr/bin/kubectl"));
        assert!(!executor.is_allowed("sh"));
        assert_eq!(executor.default_timeout(), Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output_and_exit_code() {
        let mut executor = CommandExecutor::with_timeout(Duration::from_secs(5));
        executor.allow_commands(&["sh"]);

        let output = executor
            .execute("sh", &["-c", "echo out; echo err >&2; exit 3"], None)
            .unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_times_out() {
        let mut executor = CommandExecutor::with_timeout(Duration::from_secs(5));
        executor.allow_commands(&["sleep"]);

        let err = executor
            .execute("sleep", &["5"], Some(Duration::from_millis(100)))
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_huge_timeout_does_not_overflow() {
        let mut executor = CommandExecutor::with_timeout(Duration::from_secs(5));
        executor.allow_commands(&["true"]);

        let output = executor
            .execute("true", &[], Some(Duration::from_secs(u64::MAX)))
            .unwrap();
        assert_eq!(output.exit_code, 0);
    }

    #[test]
    fn test_redact_args_masks_token() {
        let args = [
            "--server",
            "https://10.0.0.1:443",
            "--token",
            "eyJhbGciOiJSUzI1NiJ9.secret",
            "get",
            "pods",
        ];
        let logged = redact_args(&args);
        assert_eq!(
            logged,
            "--server https://10.0.0.1:443 --token <redacted> get pods"
        );
        assert!(!logged.contains("eyJ"));

        assert_eq!(
            redact_args(&["--token=abc", "get", "ns"]),
            "--token=<redacted> get ns"
        );
        assert_eq!(redact_args(&["get", "pods", "-o", "json"]), "get pods -o json");
    }
}
