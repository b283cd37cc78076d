use crate::{
    compose::DockerCompose,
    connection::ports::{DockerPort, Ports},
    errors::{ComposeError, ConfigurationError},
};

/// Handle onto one service's containers, resolved through the facade.
///
/// Holds no state of its own: every query goes back to the compose binary,
/// so the answer reflects the topology at call time.
pub struct Container<'a> {
    name: String,
    compose: &'a DockerCompose,
}

impl<'a> Container<'a> {
    pub(crate) fn new(name: impl Into<String>, compose: &'a DockerCompose) -> Self {
        Self {
            name: name.into(),
            compose,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current port mappings of this service.
    pub async fn ports(&self) -> Result<Ports, ComposeError> {
        self.compose.ports(&self.name).await
    }

    /// Host-side binding of one container port.
    pub async fn port(&self, internal_port: u16) -> Result<DockerPort, ComposeError> {
        let ports = self.ports().await?;
        ports
            .find_for_internal_port(internal_port)
            .cloned()
            .ok_or_else(|| {
                ConfigurationError::UnmappedPort {
                    service: self.name.clone(),
                    port: internal_port,
                }
                .into()
            })
    }
}
