use std::{io, sync::Arc};

use tokio::io::{AsyncBufReadExt as _, AsyncRead, BufReader};
use tracing::debug;

use crate::{errors::ExecutionError, execution::executable::ComposeExecutable};

/// Callback receiving each captured output line as it is read.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Outcome of one compose invocation: exit code plus combined output.
#[derive(Clone, Debug)]
pub struct ProcessResult {
    exit_code: i32,
    output: String,
}

impl ProcessResult {
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }
}

/// Runs compose commands to completion.
///
/// Output is drained line-by-line concurrently with the exit wait, so a
/// child producing more output than the pipe buffer holds cannot deadlock
/// against a blocked reader.
#[derive(Clone)]
pub struct SynchronousExecutable {
    executable: ComposeExecutable,
    line_sink: LineSink,
}

impl SynchronousExecutable {
    /// Wrap a raw executable; captured lines go to `tracing::debug!`.
    pub fn new(executable: ComposeExecutable) -> Self {
        Self {
            executable,
            line_sink: Arc::new(|line| debug!(target: "compose", "{line}")),
        }
    }

    /// Replace the per-line pass-through sink.
    #[must_use]
    pub fn with_line_sink(mut self, line_sink: LineSink) -> Self {
        self.line_sink = line_sink;
        self
    }

    #[must_use]
    pub const fn executable(&self) -> &ComposeExecutable {
        &self.executable
    }

    /// Run `docker-compose <args>` to completion and report the exit code
    /// together with the full captured output (stdout first, then stderr).
    /// A child killed by a signal reports exit code `-1`.
    pub async fn run(&self, args: &[&str]) -> Result<ProcessResult, ExecutionError> {
        let mut child = self.executable.execute(args)?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let command = args.join(" ");

        let (status, stdout_text, stderr_text) = tokio::join!(
            child.wait(),
            drain(stdout, self.line_sink.as_ref()),
            drain(stderr, self.line_sink.as_ref()),
        );

        let io_error = |source| ExecutionError::Io {
            command: command.clone(),
            source,
        };
        let status = status.map_err(io_error)?;
        let output = combine(stdout_text.map_err(io_error)?, stderr_text.map_err(io_error)?);

        Ok(ProcessResult {
            exit_code: status.code().unwrap_or(-1),
            output,
        })
    }
}

async fn drain(
    stream: Option<impl AsyncRead + Unpin>,
    sink: &(dyn Fn(&str) + Send + Sync),
) -> io::Result<String> {
    let Some(stream) = stream else {
        return Ok(String::new());
    };

    let mut lines = BufReader::new(stream).lines();
    let mut buffer = String::new();
    while let Some(line) = lines.next_line().await? {
        sink(&line);
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&line);
    }
    Ok(buffer)
}

fn combine(stdout: String, stderr: String) -> String {
    if stdout.is_empty() {
        stderr
    } else if stderr.is_empty() {
        stdout
    } else {
        format!("{stdout}\n{stderr}")
    }
}
