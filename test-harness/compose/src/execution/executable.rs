use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::{Child, Command};

use crate::errors::ExecutionError;

/// Name the compose binary is resolved under when no override is given.
pub const DEFAULT_COMPOSE_BINARY: &str = "docker-compose";

/// Spawns the compose binary with a fixed working directory and an
/// environment overlay, one child process per invocation.
#[derive(Clone, Debug)]
pub struct ComposeExecutable {
    binary: PathBuf,
    working_dir: PathBuf,
    environment: BTreeMap<String, String>,
}

impl ComposeExecutable {
    /// `working_dir` is the directory holding the project's compose file;
    /// `environment` is overlaid onto the inherited OS environment.
    pub fn new(working_dir: impl Into<PathBuf>, environment: BTreeMap<String, String>) -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_COMPOSE_BINARY),
            working_dir: working_dir.into(),
            environment,
        }
    }

    /// Point at a differently named or located compose binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    #[must_use]
    pub const fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Spawn `docker-compose <args>` with piped output. No timeout is
    /// applied at this layer; the caller owns the child's lifetime.
    pub fn execute(&self, args: &[&str]) -> Result<Child, ExecutionError> {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .current_dir(&self.working_dir)
            .envs(&self.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        command.spawn().map_err(|source| ExecutionError::Spawn {
            command: args.join(" "),
            source,
        })
    }
}
