use std::{env, path::PathBuf};

use crate::{domain::entities::environment::Environment, errors::RelayError};

/// Startup configuration for the relay, read once from the environment.
///
/// Every field is required except `enable_online_checks` (defaults to on,
/// matching the upstream verifier's default). Missing or invalid values fail
/// fast with [`RelayError::Configuration`] naming the offending variable, so
/// the process never starts serving half-configured.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// App Store Connect issuer id (`iss` claim of outbound assertions).
    pub issuer_id: String,
    /// Identifier of the private signing key (`kid` header).
    pub key_id: String,
    /// Bundle identifier of the app (`bid` claim, and the value every
    /// verified payload must carry).
    pub bundle_id: String,
    /// Path to the PKCS#8 EC (P-256) private key, the `.p8` file from App
    /// Store Connect.
    pub private_key_path: PathBuf,
    /// Paths to the pinned Apple root certificates (DER `.cer` or PEM).
    pub root_ca_paths: Vec<PathBuf>,
    /// Which App Store server environment this deployment talks to.
    pub environment: Environment,
    /// Whether the verifier performs online certificate revocation checks.
    pub enable_online_checks: bool,
}

const ENV_ISSUER_ID: &str = "APPLE_ISSUER_ID";
const ENV_KEY_ID: &str = "APPLE_KEY_ID";
const ENV_BUNDLE_ID: &str = "APPLE_BUNDLE_ID";
const ENV_PRIVATE_KEY_PATH: &str = "APPLE_PRIVATE_KEY_PATH";
const ENV_ROOT_CA_PATHS: &str = "APPLE_ROOT_CA_PATHS";
const ENV_API_ENV: &str = "APPLE_API_ENV";
const ENV_ENABLE_ONLINE_CHECKS: &str = "APPLE_ENABLE_ONLINE_CHECKS";

impl RelayConfig {
    pub fn try_from_env() -> Result<Self, RelayError> {
        let environment = Environment::from_config_value(&required_var(ENV_API_ENV)?)?;
        let root_ca_paths: Vec<PathBuf> = required_var(ENV_ROOT_CA_PATHS)?
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        if root_ca_paths.is_empty() {
            return Err(RelayError::Configuration(format!(
                "{ENV_ROOT_CA_PATHS} must name at least one root certificate"
            )));
        }
        let enable_online_checks = env::var(ENV_ENABLE_ONLINE_CHECKS)
            .map(|s| s != "0" && s.to_ascii_lowercase() != "false")
            .unwrap_or(true);
        Ok(Self {
            issuer_id: required_var(ENV_ISSUER_ID)?,
            key_id: required_var(ENV_KEY_ID)?,
            bundle_id: required_var(ENV_BUNDLE_ID)?,
            private_key_path: PathBuf::from(required_var(ENV_PRIVATE_KEY_PATH)?),
            root_ca_paths,
            environment,
            enable_online_checks,
        })
    }
}

fn required_var(name: &str) -> Result<String, RelayError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(RelayError::Configuration(format!("{name} is not set"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Process-wide env mutation: these assertions all run in one test to
    // avoid ordering races with the test harness's parallelism.
    #[test]
    fn try_from_env_round_trip_and_failures() {
        let set = |env_val: &str| {
            env::set_var(ENV_ISSUER_ID, "57246542-96fe-1a63-e053-0824d011072a");
            env::set_var(ENV_KEY_ID, "2X9R4HXF34");
            env::set_var(ENV_BUNDLE_ID, "com.example.app");
            env::set_var(ENV_PRIVATE_KEY_PATH, "/secrets/SubscriptionKey.p8");
            env::set_var(ENV_ROOT_CA_PATHS, "certs/AppleRootCA-G3.cer, certs/AppleRootCA-G2.cer");
            env::set_var(ENV_API_ENV, env_val);
            env::remove_var(ENV_ENABLE_ONLINE_CHECKS);
        };

        set("sandbox");
        let config = RelayConfig::try_from_env().unwrap();
        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.root_ca_paths.len(), 2);
        assert_eq!(config.root_ca_paths[1], PathBuf::from("certs/AppleRootCA-G2.cer"));
        assert!(config.enable_online_checks);

        env::set_var(ENV_ENABLE_ONLINE_CHECKS, "false");
        assert!(!RelayConfig::try_from_env().unwrap().enable_online_checks);

        set("staging");
        assert!(matches!(RelayConfig::try_from_env(), Err(RelayError::Configuration(_))));

        set("production");
        env::remove_var(ENV_ISSUER_ID);
        let err = RelayConfig::try_from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_ISSUER_ID));
    }
}
