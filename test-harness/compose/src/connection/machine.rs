use std::collections::BTreeMap;

use crate::{configuration::environment, errors::ConfigurationError};

const LOCALHOST: &str = "127.0.0.1";

/// The docker daemon host a compose project runs against: an externally
/// reachable IP plus the connection variables handed to every compose
/// invocation.
///
/// The IP is what `0.0.0.0` port bindings are rewritten to, since a
/// wildcard bind address is not independently reachable.
#[derive(Clone, Debug)]
pub struct DockerMachine {
    ip: String,
    environment: BTreeMap<String, String>,
}

impl DockerMachine {
    /// Daemon on this host; no connection variables required.
    #[must_use]
    pub fn local_machine() -> Self {
        Self {
            ip: LOCALHOST.to_owned(),
            environment: BTreeMap::new(),
        }
    }

    /// Remote daemon reachable at `ip`. `variables` must carry the
    /// connection set (`DOCKER_HOST`, plus the TLS pair when
    /// `DOCKER_TLS_VERIFY` is present) and is validated before the
    /// machine is constructed.
    pub fn remote_machine(
        ip: impl Into<String>,
        variables: BTreeMap<String, String>,
    ) -> Result<Self, ConfigurationError> {
        let environment = environment::validate_remote_environment(variables)?;
        Ok(Self {
            ip: ip.into(),
            environment,
        })
    }

    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Connection variables overlaid onto the OS environment for every
    /// compose invocation.
    #[must_use]
    pub const fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::environment::DOCKER_HOST;

    #[test]
    fn local_machine_is_loopback_with_empty_environment() {
        let machine = DockerMachine::local_machine();
        assert_eq!(machine.ip(), "127.0.0.1");
        assert!(machine.environment().is_empty());
    }

    #[test]
    fn remote_machine_validates_connection_variables() {
        let error = DockerMachine::remote_machine("192.168.99.100", BTreeMap::new()).unwrap_err();
        assert!(error.to_string().contains(DOCKER_HOST));
    }

    #[test]
    fn remote_machine_keeps_validated_variables() {
        let variables = BTreeMap::from([(
            DOCKER_HOST.to_owned(),
            "tcp://192.168.99.100:2376".to_owned(),
        )]);

        let machine = DockerMachine::remote_machine("192.168.99.100", variables.clone())
            .expect("valid remote environment");
        assert_eq!(machine.ip(), "192.168.99.100");
        assert_eq!(machine.environment(), &variables);
    }
}
