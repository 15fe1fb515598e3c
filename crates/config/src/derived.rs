//! Derived keys: values computed from other stored keys on every read.

use std::collections::HashMap;

use crate::store::ConfigEntry;
use crate::value::{ConfigValue, FromConfigValue};
use crate::{ConfigError, ConfigResult};

pub struct Derivation {
    pub key: &'static str,
    pub inputs: &'static [&'static str],
    compute: fn(&HashMap<String, ConfigEntry>) -> ConfigResult<ConfigValue>,
}

impl Derivation {
    pub fn compute(&self, entries: &HashMap<String, ConfigEntry>) -> ConfigResult<ConfigValue> {
        (self.compute)(entries)
    }
}

impl std::fmt::Debug for Derivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Derivation")
            .field("key", &self.key)
            .field("inputs", &self.inputs)
            .finish()
    }
}

fn input<T: FromConfigValue>(entries: &HashMap<String, ConfigEntry>, key: &str) -> ConfigResult<T> {
    let entry = entries
        .get(key)
        .ok_or_else(|| ConfigError::missing_required(key))?;
    T::from_config_value(key, &entry.value)
}

fn instance_num(entries: &HashMap<String, ConfigEntry>) -> ConfigResult<ConfigValue> {
    let controllers: i64 = input(entries, "CONTROLLER_NUM")?;
    let workers: i64 = input(entries, "WORKER_NUM")?;
    controllers
        .checked_add(workers)
        .map(ConfigValue::Int)
        .ok_or_else(|| ConfigError::invalid_value("INSTANCE_NUM", "instance count overflows"))
}

fn private_key(entries: &HashMap<String, ConfigEntry>) -> ConfigResult<ConfigValue> {
    let dir: String = input(entries, "PRIVATE_KEY_DIR")?;
    let key_name: String = input(entries, "KEY_NAME")?;
    Ok(ConfigValue::Str(format!("{dir}{key_name}.pem")))
}

pub static DERIVATIONS: &[Derivation] = &[
    Derivation {
        key: "INSTANCE_NUM",
        inputs: &["CONTROLLER_NUM", "WORKER_NUM"],
        compute: instance_num,
    },
    Derivation {
        key: "PRIVATE_KEY",
        inputs: &["PRIVATE_KEY_DIR", "KEY_NAME"],
        compute: private_key,
    },
];

pub fn lookup(key: &str) -> Option<&'static Derivation> {
    DERIVATIONS.iter().find(|d| d.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Category;

    fn entries(pairs: &[(&str, ConfigValue)]) -> HashMap<String, ConfigEntry> {
        pairs
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    ConfigEntry {
                        key: k.to_string(),
                        value: v.clone(),
                        category: Category::Deployment,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_instance_num_sums_counts() {
        let derivation = lookup("INSTANCE_NUM").unwrap();
        for (controllers, workers) in [(0, 0), (1, 0), (0, 7), (1, 64)] {
            let map = entries(&[
                ("CONTROLLER_NUM", ConfigValue::Int(controllers)),
                ("WORKER_NUM", ConfigValue::Int(workers)),
            ]);
            assert_eq!(
                derivation.compute(&map).unwrap(),
                ConfigValue::Int(controllers + workers)
            );
        }
    }

    #[test]
    fn test_instance_num_overflow() {
        let map = entries(&[
            ("CONTROLLER_NUM", ConfigValue::Int(i64::MAX)),
            ("WORKER_NUM", ConfigValue::Int(1)),
        ]);
        assert!(lookup("INSTANCE_NUM").unwrap().compute(&map).is_err());
    }

    #[test]
    fn test_private_key_path() {
        let map = entries(&[
            ("PRIVATE_KEY_DIR", ConfigValue::from("/home/omidm/.ssh/")),
            ("KEY_NAME", ConfigValue::from("omidm-sing-key-pair-us-west-2")),
        ]);
        assert_eq!(
            lookup("PRIVATE_KEY").unwrap().compute(&map).unwrap(),
            ConfigValue::from("/home/omidm/.ssh/omidm-sing-key-pair-us-west-2.pem")
        );
    }

    #[test]
    fn test_missing_input() {
        let map = entries(&[("CONTROLLER_NUM", ConfigValue::Int(1))]);
        assert!(matches!(
            lookup("INSTANCE_NUM").unwrap().compute(&map),
            Err(ConfigError::MissingRequired { .. })
        ));
    }
}
