use uuid::Uuid;

/// Compose project name, exported to the binary as `COMPOSE_PROJECT_NAME`
/// so that container names do not collide between concurrent runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectName(String);

impl ProjectName {
    /// Use an explicit project name. Compose expects lowercase
    /// alphanumerics; the name is passed through as-is.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Generate a unique name of the form `harness-<uuid>`.
    #[must_use]
    pub fn random() -> Self {
        Self(format!("harness-{}", Uuid::new_v4().simple()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_names_carry_the_harness_prefix() {
        assert!(ProjectName::random().as_str().starts_with("harness-"));
    }

    #[test]
    fn random_names_do_not_collide() {
        assert_ne!(ProjectName::random(), ProjectName::random());
    }
}
