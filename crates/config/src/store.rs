//! The configuration store and its builder.
//!
//! `ConfigurationStoreBuilder` is the uninitialized state; `build()` consumes
//! it and returns a ready, immutable `ConfigurationStore`. There is no way
//! back and no mutation API: reconfiguring means building a new store.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::declaration::{Declaration, DISABLED_TABLE_KEY};
use crate::derived::{self, DERIVATIONS};
use crate::profile::{ProfileRegistry, DEFAULT_PROFILE};
use crate::schema::{self, Category};
use crate::value::{ConfigValue, FromConfigValue};
use crate::{ConfigError, ConfigResult};

/// A stored (non-derived) setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: ConfigValue,
    pub category: Category,
}

pub struct ConfigurationStoreBuilder {
    base: Declaration,
    registry: ProfileRegistry,
    profiles: Vec<String>,
    overlays: Vec<Declaration>,
}

impl ConfigurationStoreBuilder {
    pub fn new() -> Self {
        Self {
            base: Declaration::embedded(),
            registry: ProfileRegistry::default(),
            profiles: Vec::new(),
            overlays: Vec::new(),
        }
    }

    /// Replace the embedded declaration.
    pub fn declaration(mut self, declaration: Declaration) -> Self {
        self.base = declaration;
        self
    }

    pub fn registry(mut self, registry: ProfileRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Select a profile. Profiles apply in the order they are selected.
    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.profiles.push(name.into());
        self
    }

    /// Apply a declaration after all profiles. Overlays apply in order.
    pub fn overlay(mut self, declaration: Declaration) -> Self {
        self.overlays.push(declaration);
        self
    }

    pub fn overlay_file<P: AsRef<Path>>(self, path: P) -> ConfigResult<Self> {
        let declaration = Declaration::from_toml_file(path)?;
        Ok(self.overlay(declaration))
    }

    pub fn env_overrides(self) -> ConfigResult<Self> {
        let declaration = Declaration::from_env()?;
        Ok(self.overlay(declaration))
    }

    pub fn build(self) -> ConfigResult<ConfigurationStore> {
        let profiles = self.registry.resolve(&self.profiles)?;

        let mut declaration = self.base;
        for profile in &profiles {
            debug!(
                profile = %profile.name,
                overrides = profile.overrides.len(),
                "applying profile"
            );
            declaration = declaration.merge(&profile.overrides);
        }
        for overlay in &self.overlays {
            declaration = declaration.merge(overlay);
        }

        let mut explicit_derived = Vec::new();
        let mut entries = HashMap::new();
        for (key, value) in declaration.resolve() {
            if derived::lookup(&key).is_some() {
                explicit_derived.push((key, value));
                continue;
            }
            let entry = match schema::lookup(&key) {
                Some(spec) => {
                    let value = spec.normalize(value);
                    spec.check(&value)?;
                    ConfigEntry {
                        key: key.clone(),
                        value,
                        category: spec.category,
                    }
                }
                None => {
                    warn!(key = %key, "key is not part of the launch schema");
                    ConfigEntry {
                        key: key.clone(),
                        value,
                        category: Category::Other,
                    }
                }
            };
            entries.insert(key, entry);
        }

        let mut missing: Vec<&str> = schema::required_keys()
            .map(|spec| spec.key)
            .filter(|key| !entries.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(ConfigError::missing_required(missing.join(", ")));
        }

        for derivation in DERIVATIONS {
            let derived_value = derivation.compute(&entries)?;
            if let Some((_, declared)) = explicit_derived.iter().find(|(k, _)| k == derivation.key)
            {
                let declared = match schema::lookup(derivation.key) {
                    Some(spec) => {
                        let declared = spec.normalize(declared.clone());
                        spec.check(&declared)?;
                        declared
                    }
                    None => declared.clone(),
                };
                if declared != derived_value {
                    return Err(ConfigError::derivation_conflict(
                        derivation.key,
                        declared.to_string(),
                        derived_value.to_string(),
                    ));
                }
                debug!(key = derivation.key, "explicit value agrees with derivation");
            }
        }

        let profile_names = if self.profiles.is_empty() {
            vec![DEFAULT_PROFILE.to_string()]
        } else {
            self.profiles
        };

        info!(
            profiles = %profile_names.join("+"),
            keys = entries.len(),
            derived = DERIVATIONS.len(),
            "configuration store ready"
        );

        Ok(ConfigurationStore {
            entries,
            profiles: profile_names,
        })
    }
}

impl Default for ConfigurationStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable, typed view of the launch configuration.
///
/// `Send + Sync`; share it as `Arc<ConfigurationStore>` and read from any
/// number of threads without locking.
#[derive(Debug, Clone)]
pub struct ConfigurationStore {
    entries: HashMap<String, ConfigEntry>,
    profiles: Vec<String>,
}

impl ConfigurationStore {
    pub fn builder() -> ConfigurationStoreBuilder {
        ConfigurationStoreBuilder::new()
    }

    /// Read `key` as `T`. Fails with `UnknownKey` for undeclared keys and
    /// `TypeMismatch` when the stored value is not a `T`.
    pub fn get<T: FromConfigValue>(&self, key: &str) -> ConfigResult<T> {
        let value = self.get_value(key)?;
        T::from_config_value(key, &value)
    }

    pub fn get_value(&self, key: &str) -> ConfigResult<ConfigValue> {
        if let Some(entry) = self.entries.get(key) {
            return Ok(entry.value.clone());
        }
        match derived::lookup(key) {
            Some(derivation) => derivation.compute(&self.entries),
            None => Err(ConfigError::unknown_key(key)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key) || derived::lookup(key).is_some()
    }

    /// All readable keys, derived ones included, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .entries
            .keys()
            .map(String::as_str)
            .chain(DERIVATIONS.iter().map(|d| d.key))
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Stored entries only; derived keys are not stored.
    pub fn entries(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.values()
    }

    pub fn entries_in(&self, category: Category) -> Vec<&ConfigEntry> {
        let mut entries: Vec<&ConfigEntry> = self
            .entries
            .values()
            .filter(|entry| entry.category == category)
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn category_of(&self, key: &str) -> ConfigResult<Category> {
        if let Some(entry) = self.entries.get(key) {
            return Ok(entry.category);
        }
        if derived::lookup(key).is_some() {
            if let Some(spec) = schema::lookup(key) {
                return Ok(spec.category);
            }
        }
        Err(ConfigError::unknown_key(key))
    }

    pub fn is_derived(&self, key: &str) -> bool {
        derived::lookup(key).is_some()
    }

    /// Profiles the store was built with, in application order.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// `CONTROLLER_NUM + WORKER_NUM`.
    pub fn total_instance_count(&self) -> ConfigResult<u64> {
        self.get("INSTANCE_NUM")
    }

    /// `PRIVATE_KEY_DIR + KEY_NAME + ".pem"`, unexpanded.
    pub fn private_key_path(&self) -> ConfigResult<String> {
        self.get("PRIVATE_KEY")
    }

    /// Every readable key with its current value, derived keys included.
    pub fn snapshot(&self) -> ConfigResult<BTreeMap<String, ConfigValue>> {
        self.keys()
            .into_iter()
            .map(|key| Ok((key.to_string(), self.get_value(key)?)))
            .collect()
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot()?)?)
    }

    /// TOML cannot hold nulls, so null keys go to the `disabled` list. The
    /// output is accepted by [`Declaration::from_toml_str`] once derived keys
    /// are left out or agree with their inputs.
    pub fn to_toml(&self) -> ConfigResult<String> {
        let mut table = toml::Table::new();
        let mut disabled = Vec::new();
        for (key, value) in self.snapshot()? {
            let value = match value {
                ConfigValue::Null => {
                    disabled.push(toml::Value::String(key));
                    continue;
                }
                ConfigValue::Bool(b) => toml::Value::Boolean(b),
                ConfigValue::Int(n) => toml::Value::Integer(n),
                ConfigValue::Str(s) => toml::Value::String(s),
                ConfigValue::Seconds(secs) => {
                    let secs = i64::try_from(secs).map_err(|_| {
                        ConfigError::invalid_value(key.as_str(), "duration too large for TOML")
                    })?;
                    toml::Value::Integer(secs)
                }
            };
            table.insert(key, value);
        }
        if !disabled.is_empty() {
            table.insert(DISABLED_TABLE_KEY.to_string(), toml::Value::Array(disabled));
        }
        Ok(toml::to_string(&table)?)
    }
}
