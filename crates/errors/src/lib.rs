use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown configuration key: {key}")]
    UnknownKey { key: String },
    #[error("type mismatch for '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },
    #[error("derivation conflict for '{key}': declared {declared}, derived {derived}")]
    DerivationConflict {
        key: String,
        declared: String,
        derived: String,
    },
    #[error("required configuration key missing: {key}")]
    MissingRequired { key: String },
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("unknown configuration profile: {0}")]
    UnknownProfile(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn unknown_key<S: Into<String>>(key: S) -> Self {
        Self::UnknownKey { key: key.into() }
    }
    pub fn type_mismatch<K, E, F>(key: K, expected: E, found: F) -> Self
    where
        K: Into<String>,
        E: Into<String>,
        F: Into<String>,
    {
        Self::TypeMismatch {
            key: key.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
    pub fn derivation_conflict<K, D, V>(key: K, declared: D, derived: V) -> Self
    where
        K: Into<String>,
        D: Into<String>,
        V: Into<String>,
    {
        Self::DerivationConflict {
            key: key.into(),
            declared: declared.into(),
            derived: derived.into(),
        }
    }
    pub fn missing_required<S: Into<String>>(key: S) -> Self {
        Self::MissingRequired { key: key.into() }
    }
    pub fn invalid_value<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn parse_error<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<anyhow::Error> for ConfigError {
    fn from(err: anyhow::Error) -> Self {
        ConfigError::Validation(err.to_string())
    }
}
