use serde::{Deserialize, Serialize};

use crate::errors::RelayError;

/// The App Store server environment a payload or deployment belongs to.
///
/// The relay is configured for exactly one environment at startup; every
/// verified payload must carry the same environment claim. `Unknown` exists
/// only so that forward-incompatible payload values deserialize instead of
/// failing; it never compares equal to a configured environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    /// Testing in the sandbox environment.
    Sandbox,
    /// The production environment.
    Production,

    #[serde(untagged)]
    Unknown(String),
}

impl Environment {
    /// Parses the startup configuration value. Unlike deserialization of
    /// payload claims, an unrecognized value here is a hard error.
    pub(crate) fn from_config_value(value: &str) -> Result<Self, RelayError> {
        match value.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(RelayError::Configuration(format!(
                "'{other}' is not a valid environment; expected 'sandbox' or 'production'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_values_are_case_insensitive() {
        assert_eq!(Environment::from_config_value("Sandbox").unwrap(), Environment::Sandbox);
        assert_eq!(Environment::from_config_value("PRODUCTION").unwrap(), Environment::Production);
    }

    #[test]
    fn unrecognized_config_value_is_rejected() {
        assert!(matches!(
            Environment::from_config_value("staging"),
            Err(RelayError::Configuration(_))
        ));
    }

    #[test]
    fn unknown_payload_value_still_deserializes_but_never_matches() {
        let env: Environment = serde_json::from_str("\"Xcode\"").unwrap();
        assert_eq!(env, Environment::Unknown("Xcode".to_string()));
        assert_ne!(env, Environment::Sandbox);
    }
}
