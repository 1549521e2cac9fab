//! Blocking runner for external command-line tools.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::errors::{ToolError, ToolResult};

/// Exit status and captured text of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// Process exit code (-1 when killed by a signal).
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// An external program that takes an argument list and reports an exit status.
///
/// Invocations block the calling thread until the process ends.
pub trait MediaTool: Send + Sync {
    /// Program name used in logs and errors.
    fn name(&self) -> &str;

    /// Arguments prepended to every invocation.
    fn base_args(&self) -> &[String] {
        &[]
    }

    /// Run the program with `args` appended to the base arguments.
    fn run(&self, args: &[String]) -> ToolResult<ToolOutput>;

    /// Full command line for logging.
    fn command_line(&self, args: &[String]) -> String {
        let mut parts = vec![self.name().to_string()];
        parts.extend(self.base_args().iter().map(|a| quote_arg(a)));
        parts.extend(args.iter().map(|a| quote_arg(a)));
        parts.join(" ")
    }
}

/// [`MediaTool`] backed by a real process.
#[derive(Debug, Clone)]
pub struct ProcessTool {
    program: String,
    base_args: Vec<String>,
    timeout: Option<Duration>,
}

/// Base arguments for every ffmpeg invocation.
pub const FFMPEG_BASE_ARGS: [&str; 4] = ["-hide_banner", "-loglevel", "warning", "-y"];

const POLL_INTERVAL: Duration = Duration::from_millis(50);

impl ProcessTool {
    /// Runner for `program` with no base arguments and no time bound.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            timeout: None,
        }
    }

    /// ffmpeg runner: quiet banner, warnings only, overwrite outputs.
    pub fn ffmpeg(program: impl Into<String>) -> Self {
        Self::new(program).with_base_args(FFMPEG_BASE_ARGS)
    }

    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Bound each invocation; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn wait_bounded(&self, mut child: Child, limit: Duration) -> ToolResult<ToolOutput> {
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= limit => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!("{} killed after {:?}", self.program, limit);
                    return Err(ToolError::Timeout {
                        program: self.program.clone(),
                        limit,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(ToolError::io(&self.program, e)),
            }
        };

        Ok(ToolOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
        })
    }
}

impl MediaTool for ProcessTool {
    fn name(&self) -> &str {
        &self.program
    }

    fn base_args(&self) -> &[String] {
        &self.base_args
    }

    fn run(&self, args: &[String]) -> ToolResult<ToolOutput> {
        tracing::debug!("Running: {}", self.command_line(args));

        let child = Command::new(&self.program)
            .args(&self.base_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::spawn(&self.program, e))?;

        match self.timeout {
            Some(limit) => self.wait_bounded(child, limit),
            None => {
                let output = child
                    .wait_with_output()
                    .map_err(|e| ToolError::io(&self.program, e))?;
                Ok(ToolOutput {
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                })
            }
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).to_string()
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Quote an argument for display if it contains whitespace or quotes.
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"' || c == ';') {
        format!("'{}'", arg.replace('\'', "'\\''"))
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_line_includes_base_args() {
        let tool = ProcessTool::ffmpeg("ffmpeg");
        let line = tool.command_line(&args(&["-i", "my file.mp4", "out.mp4"]));
        assert_eq!(
            line,
            "ffmpeg -hide_banner -loglevel warning -y -i 'my file.mp4' out.mp4"
        );
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(quote_arg("plain"), "plain");
        assert_eq!(quote_arg(""), "''");
        assert_eq!(quote_arg("it's"), "'it'\\''s'");
        assert_eq!(quote_arg("[0:a]anull[a];[a]amix"), "'[0:a]anull[a];[a]amix'");
    }

    #[test]
    fn missing_program_is_not_found() {
        let tool = ProcessTool::new("vam-definitely-not-installed");
        let err = tool.run(&[]).unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_stderr() {
        let tool = ProcessTool::new("sh");
        let out = tool
            .run(&args(&["-c", "echo hello; echo oops >&2; exit 3"]))
            .unwrap();
        assert_eq!(out.exit_code, 3);
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn bounded_wait_returns_output() {
        let tool = ProcessTool::new("sh").with_timeout(Some(Duration::from_secs(10)));
        let out = tool.run(&args(&["-c", "echo done"])).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "done");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_process() {
        let tool = ProcessTool::new("sleep").with_timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();
        let err = tool.run(&args(&["5"])).unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
