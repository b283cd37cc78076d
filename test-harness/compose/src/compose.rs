use std::{collections::BTreeSet, io, path::PathBuf, time::Duration};

use tokio::{io::AsyncWrite, process::Child, time::timeout};
use tracing::{info, warn};

use crate::{
    configuration::project::ProjectName,
    connection::{container::Container, machine::DockerMachine, names, ports::Ports},
    errors::{ComposeError, ConfigurationError, ExecutionError},
    execution::{
        executable::ComposeExecutable,
        sync::{ProcessResult, SynchronousExecutable},
        version::ComposeVersion,
    },
};

/// Variable compose reads the project name from; passing it through the
/// environment keeps every invocation a plain sub-command vector.
pub const COMPOSE_PROJECT_NAME: &str = "COMPOSE_PROJECT_NAME";

const VERSION_1_7_0: ComposeVersion = ComposeVersion::new(1, 7, 0);
// Bound on waiting for a log process to exit once its stream has closed.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);
const DOWN_UNSUPPORTED_MARKER: &str = "No such command";

/// Error policy applied when one compose sub-command exits non-zero.
#[derive(Clone, Copy, Debug)]
enum FailurePolicy {
    Raise,
    /// Swallow the failure when the output shows this compose version has
    /// no `down` sub-command at all; raise otherwise.
    SwallowMissingDownCommand,
}

/// Extra flags inserted between `exec` and the container name, e.g. `-d`.
#[derive(Clone, Debug, Default)]
pub struct ExecOptions(Vec<String>);

impl ExecOptions {
    pub fn new(options: impl IntoIterator<Item: Into<String>>) -> Self {
        Self(options.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    fn as_args(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Command line run inside the container, appended after its name.
#[derive(Clone, Debug, Default)]
pub struct ExecArguments(Vec<String>);

impl ExecArguments {
    pub fn new(arguments: impl IntoIterator<Item: Into<String>>) -> Self {
        Self(arguments.into_iter().map(Into::into).collect())
    }

    fn as_args(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Facade over the compose binary.
///
/// Every operation is one request/response cycle against a fresh child
/// process; no state is carried between calls.
pub struct DockerCompose {
    executable: SynchronousExecutable,
    machine: DockerMachine,
}

impl DockerCompose {
    /// Wire the facade from configuration pieces: the directory holding
    /// the project's compose file, a project name, and the daemon host.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        project: ProjectName,
        machine: DockerMachine,
    ) -> Self {
        let mut environment = machine.environment().clone();
        environment.insert(COMPOSE_PROJECT_NAME.to_owned(), project.as_str().to_owned());

        Self::with_executable(ComposeExecutable::new(project_dir, environment), machine)
    }

    /// Wire the facade onto an already-configured executable.
    pub fn with_executable(executable: ComposeExecutable, machine: DockerMachine) -> Self {
        Self {
            executable: SynchronousExecutable::new(executable),
            machine,
        }
    }

    #[must_use]
    pub const fn machine(&self) -> &DockerMachine {
        &self.machine
    }

    /// Build the project's images.
    pub async fn build(&self) -> Result<(), ComposeError> {
        info!("building compose images");
        self.execute(FailurePolicy::Raise, &["build"]).await?;
        Ok(())
    }

    /// Bring the project up detached.
    pub async fn up(&self) -> Result<(), ComposeError> {
        info!("bringing up compose services");
        self.execute(FailurePolicy::Raise, &["up", "-d"]).await?;
        Ok(())
    }

    /// Tear the project down. Compose versions predating the `down`
    /// sub-command are tolerated.
    pub async fn down(&self) -> Result<(), ComposeError> {
        info!("tearing down compose services");
        self.execute(FailurePolicy::SwallowMissingDownCommand, &["down"])
            .await?;
        Ok(())
    }

    /// Kill the project's containers.
    pub async fn kill(&self) -> Result<(), ComposeError> {
        info!("killing compose services");
        self.execute(FailurePolicy::Raise, &["kill"]).await?;
        Ok(())
    }

    /// Remove stopped containers without prompting.
    pub async fn rm(&self) -> Result<(), ComposeError> {
        info!("removing stopped compose containers");
        self.execute(FailurePolicy::Raise, &["rm", "-f"]).await?;
        Ok(())
    }

    /// Service names with at least one container in the project.
    pub async fn ps(&self) -> Result<BTreeSet<String>, ComposeError> {
        let result = self.execute(FailurePolicy::Raise, &["ps"]).await?;
        Ok(names::parse_from_ps_output(result.output()))
    }

    /// Current port mappings of one service, with wildcard binds rewritten
    /// to the machine IP. Fails when the service has no container.
    pub async fn ports(&self, service: &str) -> Result<Ports, ComposeError> {
        let result = self.execute(FailurePolicy::Raise, &["ps", service]).await?;
        if result.output().is_empty() {
            return Err(ConfigurationError::NoSuchService {
                service: service.to_owned(),
            }
            .into());
        }

        Ok(Ports::parse_from_ps_output(result.output(), self.machine.ip()))
    }

    /// Run a command inside a service's container and return its output.
    /// Requires compose 1.7.0 or newer.
    pub async fn exec(
        &self,
        options: ExecOptions,
        container: &str,
        arguments: ExecArguments,
    ) -> Result<String, ComposeError> {
        self.verify_version_at_least(VERSION_1_7_0, "exec").await?;

        let mut args = vec!["exec"];
        args.extend(options.as_args());
        args.push(container);
        args.extend(arguments.as_args());

        let result = self.execute(FailurePolicy::Raise, &args).await?;
        Ok(result.output().to_owned())
    }

    /// Stream one service's logs into `sink`.
    ///
    /// Copies the log stream until it closes, then waits up to two minutes
    /// for the process to exit. Returns `false` when the stream was
    /// interrupted before the logs were fully collected; a container still
    /// running after the stream closed is not a failure.
    pub async fn write_logs<W>(&self, container: &str, sink: &mut W) -> Result<bool, ComposeError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut child = self.follow_logs(container).await?;
        let command = format!("logs {container}");
        let mut stdout = child.stdout.take().ok_or_else(|| ExecutionError::Io {
            command: command.clone(),
            source: io::Error::other("log stream was not captured"),
        })?;

        match tokio::io::copy(&mut stdout, sink).await {
            Ok(_) => {}
            Err(source) if source.kind() == io::ErrorKind::Interrupted => {
                let _ = child.start_kill();
                return Ok(false);
            }
            Err(source) => return Err(ExecutionError::Io { command, source }.into()),
        }

        match timeout(COMMAND_TIMEOUT, child.wait()).await {
            Ok(Ok(_status)) => {}
            Ok(Err(source)) => return Err(ExecutionError::Io { command, source }.into()),
            Err(_elapsed) => {}
        }
        Ok(true)
    }

    /// Handle onto one service's containers.
    #[must_use]
    pub fn container(&self, name: impl Into<String>) -> Container<'_> {
        Container::new(name, self)
    }

    /// Version reported by the compose binary's `-v` output.
    pub async fn version(&self) -> Result<ComposeVersion, ComposeError> {
        let result = self.execute(FailurePolicy::Raise, &["-v"]).await?;
        Ok(ComposeVersion::parse_from_version_output(result.output())?)
    }

    async fn verify_version_at_least(
        &self,
        minimum: ComposeVersion,
        operation: &'static str,
    ) -> Result<(), ComposeError> {
        let version = self.version().await?;
        if version >= minimum {
            return Ok(());
        }

        Err(ConfigurationError::UnsupportedVersion { operation, minimum }.into())
    }

    // The `--follow` flag only exists from 1.7.0 on; older versions get a
    // one-shot dump of the logs so far.
    async fn follow_logs(&self, container: &str) -> Result<Child, ComposeError> {
        let args = if self.version().await? >= VERSION_1_7_0 {
            vec!["logs", "--no-color", "--follow", container]
        } else {
            vec!["logs", "--no-color", container]
        };
        Ok(self.executable.executable().execute(&args)?)
    }

    async fn execute(
        &self,
        policy: FailurePolicy,
        args: &[&str],
    ) -> Result<ProcessResult, ComposeError> {
        let result = self.executable.run(args).await?;
        if result.exit_code() != 0 {
            handle_failure(policy, args, &result)?;
        }
        Ok(result)
    }
}

fn handle_failure(
    policy: FailurePolicy,
    args: &[&str],
    result: &ProcessResult,
) -> Result<(), ComposeError> {
    match policy {
        FailurePolicy::Raise => Err(non_zero_exit(args, result).into()),
        FailurePolicy::SwallowMissingDownCommand => {
            if result.output().contains(DOWN_UNSUPPORTED_MARKER) {
                warn!(
                    exit_code = result.exit_code(),
                    "`docker-compose down` is not supported by this compose version; skipping. \
                     Updating to 1.6+ is likely to fix this."
                );
                Ok(())
            } else {
                Err(non_zero_exit(args, result).into())
            }
        }
    }
}

fn non_zero_exit(args: &[&str], result: &ProcessResult) -> ExecutionError {
    ExecutionError::NonZeroExit {
        command: args.join(" "),
        exit_code: result.exit_code(),
        output: result.output().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_exports_the_project_name_to_compose() {
        let compose = DockerCompose::new(
            "/tmp/project",
            ProjectName::new("harness-test"),
            DockerMachine::local_machine(),
        );

        assert_eq!(
            compose
                .executable
                .executable()
                .environment()
                .get(COMPOSE_PROJECT_NAME)
                .map(String::as_str),
            Some("harness-test")
        );
    }

    #[test]
    fn remote_variables_reach_the_executable_environment() {
        let variables = std::collections::BTreeMap::from([(
            crate::configuration::environment::DOCKER_HOST.to_owned(),
            "tcp://192.168.99.100:2376".to_owned(),
        )]);
        let machine = DockerMachine::remote_machine("192.168.99.100", variables)
            .expect("valid remote environment");

        let compose = DockerCompose::new("/tmp/project", ProjectName::new("p"), machine);
        assert!(
            compose
                .executable
                .executable()
                .environment()
                .contains_key(crate::configuration::environment::DOCKER_HOST)
        );
    }
}
