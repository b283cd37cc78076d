use std::io;

use crate::execution::version::ComposeVersion;

/// Preconditions unmet before the compose binary is invoked.
///
/// Every variant carries enough context for the caller to fix the
/// configuration without reading harness internals.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error(
        "Missing required environment variables: {missing}. Please run \
         `docker-machine env <machine-name>` and ensure they are set on the configuration."
    )]
    MissingEnvironmentVariables { missing: String },
    #[error("No container with name '{service}' found")]
    NoSuchService { service: String },
    #[error("no host mapping for internal port {port} of '{service}'")]
    UnmappedPort { service: String, port: u16 },
    #[error("You need at least docker-compose {minimum} to run docker-compose {operation}")]
    UnsupportedVersion {
        operation: &'static str,
        minimum: ComposeVersion,
    },
    #[error("unable to parse a docker-compose version out of {output:?}")]
    MalformedVersion { output: String },
}

/// Failures of a compose invocation itself.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("'docker-compose {command}' returned exit code {exit_code}\nThe output was:\n{output}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        output: String,
    },
    #[error("failed to spawn 'docker-compose {command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to capture output of 'docker-compose {command}': {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Top-level error surfaced by every harness operation.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
