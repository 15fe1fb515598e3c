use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::schema;
use crate::value::ConfigValue;
use crate::{ConfigError, ConfigResult};

/// Prefix of environment variables that override declared keys.
pub const ENV_PREFIX: &str = "NIMBUS_";

/// Top-level array in a TOML overlay listing keys declared as `null`.
pub const DISABLED_TABLE_KEY: &str = "disabled";

/// An ordered list of key assignments.
///
/// A key may be assigned more than once; when the declaration is resolved the
/// last assignment wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declaration {
    assignments: Vec<(String, ConfigValue)>,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.assignments.push((key.into(), value.into()));
    }

    /// Append every assignment of `other` after the ones already present.
    pub fn merge(mut self, other: &Declaration) -> Self {
        self.assignments.extend(other.assignments.iter().cloned());
        self
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.assignments.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Collapse repeated assignments, keeping the last value of each key.
    pub fn resolve(&self) -> HashMap<String, ConfigValue> {
        let mut resolved = HashMap::with_capacity(self.assignments.len());
        for (key, value) in &self.assignments {
            if let Some(previous) = resolved.insert(key.clone(), value.clone()) {
                debug!(key = %key, from = %previous, to = %value, "key redeclared");
            }
        }
        resolved
    }

    /// The cluster launch manifest (us-west-2, nimbus build layout).
    pub fn embedded() -> Self {
        Declaration::new()
            // EC2
            .set("EC2_LOCATION", "us-west-2")
            .set("UBUNTU_AMI", "ami-fa9cf1ca")
            .set("NIMBUS_AMI", "ami-1f868b2f")
            .set("KEY_NAME", "omidm-sing-key-pair-us-west-2")
            .set("SECURITY_GROUP", "nimbus_sg_uswest2")
            .set("CONTROLLER_INSTANCE_TYPE", "c3.4xlarge")
            .set("WORKER_INSTANCE_TYPE", "c3.2xlarge")
            .set("PLACEMENT", "us-west-2c")
            .set("PLACEMENT_GROUP", "nimbus-cluster")
            .set("PRIVATE_KEY_DIR", "/home/omidm/.ssh/")
            .set("CONTROLLER_NUM", 0)
            .set("WORKER_NUM", 0)
            // controller
            .set("ASSIGNER_THREAD_NUM", 8)
            .set("BATCH_ASSIGN_NUM", 200)
            .set("COMMAND_BATCH_SIZE", 10000)
            .set("DEACTIVATE_CONTROLLER_TEMPLATE", false)
            .set("DEACTIVATE_COMPLEX_MEMOIZATION", false)
            .set("DEACTIVATE_BINDING_MEMOIZATION", false)
            .set("DEACTIVATE_WORKER_TEMPLATE", false)
            .set("DEACTIVATE_MEGA_RCR_JOB", false)
            .set("DEACTIVATE_DM_QUERY_CACHE", false)
            .set("ACTIVATE_LB", false)
            .set("ACTIVATE_FT", false)
            .set("LB_PERIOD", ConfigValue::seconds(60))
            .set("FT_PERIOD", ConfigValue::seconds(600))
            .set("FIRST_PORT", 5800)
            // worker / simulation
            .set("SIMULATION_SCALE", 1024)
            .set("PART_X", 8)
            .set("PART_Y", 8)
            .set("PART_Z", 8)
            .set("PROJ_PART_X", 8)
            .set("PROJ_PART_Y", 8)
            .set("PROJ_PART_Z", 8)
            .set("FRAME_NUMBER", 1)
            .set("OTHREAD_NUM", 8)
            .set("ITERATION_BATCH", 1)
            .set("MAX_ITERATION", 100)
            .set("NO_PROJ_BOTTLENECK", false)
            .set("WRITE_PER_PART", true)
            .set("RUN_WITH_TASKSET", false)
            .set("WORKER_TASKSET", "0-3,8-11")
            // logging
            .set("STD_OUT_LOG", "ec2_log.txt")
            .set("LOAD_BALANCER_LOG", "load_balancer_log")
            .set("SCHED_PER_ITER_STAT_LOG", "controller_stats.txt")
            .set("WORKER_LB_LOG", "lb_log.txt")
            .set("WORKER_FINAL_STAT_LOG", "time_per_thread.txt")
            .set("WORKER_PER_ITER_STAT_LOG", "main_timers.txt")
            .set("OUTPUT_PATH", "output/")
            // build / path
            .set("SOURCE_NIMBUS_ROOT", "~/cloud/src/nimbus/")
            .set("EC2_NIMBUS_ROOT", "~/cloud/src/nimbus/")
            .set("REL_APPLICATION_PATH", "application/water_multiple/Build/Release/")
            .set("REL_SCHEDULER_PATH", "test/scheduler_v3/")
            .set("REL_WORKER_PATH", "test/water_multiple/")
            .set("NIMBUS_LIB", "libnimbus.so")
            .set("APPLICATION_LIB", "libwater_app.so")
            .set("SCHEDULER_BINARY", "scheduler")
            .set("WORKER_BINARY", "worker")
    }

    /// Parse a TOML overlay: a flat table of keys to strings, integers or
    /// booleans, plus an optional `disabled = [..]` list of keys set to null.
    pub fn from_toml_str(toml_str: &str) -> ConfigResult<Self> {
        let mut table: toml::Table = toml::from_str(toml_str)?;
        let mut declaration = Declaration::new();

        let disabled = match table.remove(DISABLED_TABLE_KEY) {
            Some(toml::Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    toml::Value::String(key) => Ok(key),
                    other => Err(ConfigError::parse_error(format!(
                        "'{DISABLED_TABLE_KEY}' entries must be key names, found {other}"
                    ))),
                })
                .collect::<ConfigResult<Vec<_>>>()?,
            Some(other) => {
                return Err(ConfigError::parse_error(format!(
                    "'{DISABLED_TABLE_KEY}' must be an array of key names, found {other}"
                )))
            }
            None => Vec::new(),
        };

        for (key, value) in table {
            if disabled.contains(&key) {
                return Err(ConfigError::invalid_value(
                    key,
                    "declared and disabled in the same overlay",
                ));
            }
            let value = match value {
                toml::Value::String(s) => ConfigValue::Str(s),
                toml::Value::Integer(n) => ConfigValue::Int(n),
                toml::Value::Boolean(b) => ConfigValue::Bool(b),
                other => {
                    return Err(ConfigError::parse_error(format!(
                        "unsupported value for '{key}': {} (expected string, integer or boolean)",
                        other.type_str()
                    )))
                }
            };
            declaration.push(key, value);
        }

        for key in disabled {
            declaration.push(key, ConfigValue::Null);
        }

        Ok(declaration)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Io(format!("failed to read overlay {}: {e}", path.display()))
        })?;
        let declaration = Self::from_toml_str(&content)?;
        debug!(
            path = %path.display(),
            assignments = declaration.len(),
            "loaded TOML overlay"
        );
        Ok(declaration)
    }

    /// Build a declaration from `PREFIXKEY=value` pairs. Values are parsed by
    /// the schema kind of `KEY`; variables naming keys outside the schema are
    /// skipped.
    pub fn from_overrides<I, K, V>(pairs: I, prefix: &str) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut declaration = Declaration::new();
        for (name, raw) in pairs {
            let Some(key) = name.as_ref().strip_prefix(prefix) else {
                continue;
            };
            match schema::lookup(key) {
                Some(spec) => {
                    let value = spec.parse_raw(raw.as_ref())?;
                    debug!(key, value = %value, "environment override");
                    declaration.push(key, value);
                }
                None => warn!(
                    variable = name.as_ref(),
                    "ignoring override for unknown configuration key"
                ),
            }
        }
        Ok(declaration)
    }

    /// Overrides taken from `NIMBUS_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_overrides(std::env::vars(), ENV_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_assignment_wins() {
        let declaration = Declaration::new()
            .set("NIMBUS_AMI", "ami-9996aea9")
            .set("NIMBUS_AMI", "ami-1f868b2f");
        assert_eq!(declaration.len(), 2);

        let resolved = declaration.resolve();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["NIMBUS_AMI"], ConfigValue::from("ami-1f868b2f"));
    }

    #[test]
    fn test_embedded_covers_schema() {
        let resolved = Declaration::embedded().resolve();
        for spec in schema::required_keys() {
            assert!(resolved.contains_key(spec.key), "missing {}", spec.key);
        }
        assert!(!resolved.contains_key("INSTANCE_NUM"));
        assert!(!resolved.contains_key("PRIVATE_KEY"));
    }

    #[test]
    fn test_merge_appends() {
        let base = Declaration::new().set("WORKER_NUM", 0);
        let overlay = Declaration::new().set("WORKER_NUM", 4);
        let merged = base.merge(&overlay);
        assert_eq!(merged.resolve()["WORKER_NUM"], ConfigValue::Int(4));
    }

    #[test]
    fn test_from_toml_str() {
        let toml_str = r#"
WORKER_NUM = 16
CONTROLLER_INSTANCE_TYPE = "c3.8xlarge"
ACTIVATE_LB = true
disabled = ["PLACEMENT_GROUP"]
"#;
        let resolved = Declaration::from_toml_str(toml_str).unwrap().resolve();
        assert_eq!(resolved["WORKER_NUM"], ConfigValue::Int(16));
        assert_eq!(
            resolved["CONTROLLER_INSTANCE_TYPE"],
            ConfigValue::from("c3.8xlarge")
        );
        assert_eq!(resolved["ACTIVATE_LB"], ConfigValue::Bool(true));
        assert_eq!(resolved["PLACEMENT_GROUP"], ConfigValue::Null);
    }

    #[test]
    fn test_from_toml_str_rejects_unsupported_values() {
        assert!(matches!(
            Declaration::from_toml_str("SIMULATION_SCALE = 1.5"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Declaration::from_toml_str("disabled = \"PLACEMENT\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Declaration::from_toml_str("PLACEMENT = \"us-west-2a\"\ndisabled = [\"PLACEMENT\"]"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(Declaration::from_toml_str("not toml at all =").is_err());
    }

    #[test]
    fn test_from_overrides() {
        let vars = vec![
            ("NIMBUS_WORKER_NUM", "8"),
            ("NIMBUS_PLACEMENT_GROUP", "none"),
            ("NIMBUS_LB_PERIOD", "30"),
            ("NIMBUS_NOT_A_KEY", "1"),
            ("HOME", "/root"),
        ];
        let resolved = Declaration::from_overrides(vars, ENV_PREFIX)
            .unwrap()
            .resolve();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved["WORKER_NUM"], ConfigValue::Int(8));
        assert_eq!(resolved["PLACEMENT_GROUP"], ConfigValue::Null);
        assert_eq!(resolved["LB_PERIOD"], ConfigValue::Seconds(30));
    }

    #[test]
    fn test_from_overrides_rejects_bad_values() {
        let vars = vec![("NIMBUS_ACTIVATE_FT", "sometimes")];
        assert!(matches!(
            Declaration::from_overrides(vars, ENV_PREFIX),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
