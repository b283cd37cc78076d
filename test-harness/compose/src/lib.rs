//! Drives an external `docker-compose` binary to orchestrate
//! multi-container test environments, parsing its CLI output into
//! container names, port mappings, and versions.

pub mod compose;
pub mod configuration;
pub mod connection;
pub mod errors;
pub mod execution;

pub use compose::{DockerCompose, ExecArguments, ExecOptions};
pub use configuration::{
    environment::{DOCKER_CERT_PATH, DOCKER_HOST, DOCKER_TLS_VERIFY, validate_remote_environment},
    project::ProjectName,
};
pub use connection::{
    container::Container,
    machine::DockerMachine,
    ports::{DockerPort, Ports},
};
pub use errors::{ComposeError, ConfigurationError, ExecutionError};
pub use execution::{
    executable::ComposeExecutable,
    sync::{LineSink, ProcessResult, SynchronousExecutable},
    version::ComposeVersion,
};
