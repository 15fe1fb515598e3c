use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::{ConfigError, ConfigResult};

/// A single declared configuration value.
///
/// `Null` is a declared "disabled / use default" marker and is distinct from
/// a key that was never declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Duration in whole seconds.
    Seconds(u64),
}

/// Runtime type tag of a [`ConfigValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Str,
    Seconds,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Int => "integer",
            ValueKind::Str => "string",
            ValueKind::Seconds => "duration",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigValue {
    pub fn seconds(secs: u64) -> Self {
        ConfigValue::Seconds(secs)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Null => ValueKind::Null,
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Int(_) => ValueKind::Int,
            ConfigValue::Str(_) => ValueKind::Str,
            ConfigValue::Seconds(_) => ValueKind::Seconds,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => f.write_str("null"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(n) => write!(f, "{n}"),
            ConfigValue::Str(s) => write!(f, "{s:?}"),
            ConfigValue::Seconds(secs) => write!(f, "{secs}s"),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<u16> for ConfigValue {
    fn from(value: u16) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<Duration> for ConfigValue {
    fn from(value: Duration) -> Self {
        ConfigValue::Seconds(value.as_secs())
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ConfigValue::Null, Into::into)
    }
}

/// Typed read of a stored value. Implementations never coerce across kinds.
pub trait FromConfigValue: Sized {
    fn expected() -> &'static str;

    fn from_config_value(key: &str, value: &ConfigValue) -> ConfigResult<Self>;
}

fn mismatch<T: FromConfigValue>(key: &str, found: &ConfigValue) -> ConfigError {
    ConfigError::type_mismatch(key, T::expected(), found.kind().as_str())
}

impl FromConfigValue for ConfigValue {
    fn expected() -> &'static str {
        "any"
    }

    fn from_config_value(_key: &str, value: &ConfigValue) -> ConfigResult<Self> {
        Ok(value.clone())
    }
}

impl FromConfigValue for String {
    fn expected() -> &'static str {
        "string"
    }

    fn from_config_value(key: &str, value: &ConfigValue) -> ConfigResult<Self> {
        match value {
            ConfigValue::Str(s) => Ok(s.clone()),
            other => Err(mismatch::<Self>(key, other)),
        }
    }
}

impl FromConfigValue for bool {
    fn expected() -> &'static str {
        "boolean"
    }

    fn from_config_value(key: &str, value: &ConfigValue) -> ConfigResult<Self> {
        match value {
            ConfigValue::Bool(b) => Ok(*b),
            other => Err(mismatch::<Self>(key, other)),
        }
    }
}

impl FromConfigValue for i64 {
    fn expected() -> &'static str {
        "integer"
    }

    fn from_config_value(key: &str, value: &ConfigValue) -> ConfigResult<Self> {
        match value {
            ConfigValue::Int(n) => Ok(*n),
            other => Err(mismatch::<Self>(key, other)),
        }
    }
}

macro_rules! impl_from_config_value_unsigned {
    ($($ty:ty),*) => {
        $(
            impl FromConfigValue for $ty {
                fn expected() -> &'static str {
                    stringify!($ty)
                }

                fn from_config_value(key: &str, value: &ConfigValue) -> ConfigResult<Self> {
                    match value {
                        ConfigValue::Int(n) => <$ty>::try_from(*n).map_err(|_| {
                            ConfigError::type_mismatch(
                                key,
                                stringify!($ty),
                                format!("integer {n} out of range"),
                            )
                        }),
                        other => Err(mismatch::<Self>(key, other)),
                    }
                }
            }
        )*
    };
}

impl_from_config_value_unsigned!(u16, u32, u64, usize);

impl FromConfigValue for Duration {
    fn expected() -> &'static str {
        "duration"
    }

    fn from_config_value(key: &str, value: &ConfigValue) -> ConfigResult<Self> {
        match value {
            ConfigValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            other => Err(mismatch::<Self>(key, other)),
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for Option<T> {
    fn expected() -> &'static str {
        T::expected()
    }

    fn from_config_value(key: &str, value: &ConfigValue) -> ConfigResult<Self> {
        match value {
            ConfigValue::Null => Ok(None),
            other => T::from_config_value(key, other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_reads_do_not_coerce() {
        let value = ConfigValue::from("5800");
        assert_eq!(String::from_config_value("K", &value).unwrap(), "5800");
        assert!(matches!(
            u16::from_config_value("K", &value),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unsigned_range_check() {
        let value = ConfigValue::Int(-1);
        assert!(u64::from_config_value("K", &value).is_err());
        assert_eq!(i64::from_config_value("K", &value).unwrap(), -1);

        let value = ConfigValue::Int(70000);
        assert!(u16::from_config_value("K", &value).is_err());
        assert_eq!(u32::from_config_value("K", &value).unwrap(), 70000);
    }

    #[test]
    fn test_seconds_read_as_duration_only() {
        let value = ConfigValue::seconds(60);
        assert_eq!(
            Duration::from_config_value("LB_PERIOD", &value).unwrap(),
            Duration::from_secs(60)
        );
        assert!(u64::from_config_value("LB_PERIOD", &value).is_err());
    }

    #[test]
    fn test_option_reads_null_as_none() {
        let null = ConfigValue::Null;
        assert_eq!(
            Option::<String>::from_config_value("PLACEMENT_GROUP", &null).unwrap(),
            None
        );
        assert!(String::from_config_value("PLACEMENT_GROUP", &null).is_err());

        let set = ConfigValue::from("nimbus-cluster");
        assert_eq!(
            Option::<String>::from_config_value("PLACEMENT_GROUP", &set).unwrap(),
            Some("nimbus-cluster".to_string())
        );
    }

    #[test]
    fn test_from_option() {
        assert_eq!(ConfigValue::from(None::<&str>), ConfigValue::Null);
        assert_eq!(ConfigValue::from(Some("x")), ConfigValue::Str("x".to_string()));
    }

    #[test]
    fn test_serialize_untagged() {
        let values = vec![
            ConfigValue::Null,
            ConfigValue::Bool(true),
            ConfigValue::Int(8),
            ConfigValue::from("c3.2xlarge"),
            ConfigValue::seconds(600),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,true,8,"c3.2xlarge",600]"#);
    }
}
