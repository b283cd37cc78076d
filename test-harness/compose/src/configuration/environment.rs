use std::collections::{BTreeMap, BTreeSet};

use crate::errors::ConfigurationError;

/// Address of the docker daemon, e.g. `tcp://192.168.99.100:2376`.
pub const DOCKER_HOST: &str = "DOCKER_HOST";
/// Presence of this variable (any value) switches the connection to
/// TLS-verified mode.
pub const DOCKER_TLS_VERIFY: &str = "DOCKER_TLS_VERIFY";
/// Directory holding the client certificates for TLS-verified connections.
pub const DOCKER_CERT_PATH: &str = "DOCKER_CERT_PATH";

const SECURE_VARIABLES: [&str; 2] = [DOCKER_CERT_PATH, DOCKER_TLS_VERIFY];

/// Check that `variables` carries everything needed to reach a remote
/// daemon, returning the map unchanged when it does.
///
/// `DOCKER_HOST` is always required. If `DOCKER_TLS_VERIFY` is present at
/// all, the full secure set (`DOCKER_TLS_VERIFY`, `DOCKER_CERT_PATH`) is
/// required too. A variable set to the empty string counts as missing.
/// Unknown extra variables are passed through untouched.
pub fn validate_remote_environment(
    variables: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ConfigurationError> {
    let missing = missing_variables(&variables);
    if missing.is_empty() {
        return Ok(variables);
    }

    Err(ConfigurationError::MissingEnvironmentVariables {
        missing: missing.into_iter().collect::<Vec<_>>().join(", "),
    })
}

fn missing_variables(variables: &BTreeMap<String, String>) -> BTreeSet<&'static str> {
    let mut required = BTreeSet::from([DOCKER_HOST]);
    if variables.contains_key(DOCKER_TLS_VERIFY) {
        required.extend(SECURE_VARIABLES);
    }

    required
        .into_iter()
        .filter(|name| variables.get(*name).is_none_or(|value| value.is_empty()))
        .collect()
}
