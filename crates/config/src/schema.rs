//! Key schema for the cluster launch declaration.
//!
//! Every key the launch tooling consumes is listed here with its category and
//! value kind. The builder checks declarations against this table: required
//! keys present, kinds matching, `null` only where a key may be disabled.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ConfigValue;
use crate::{ConfigError, ConfigResult};

/// Logical grouping of keys. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Deployment,
    Controller,
    Simulation,
    Logging,
    Build,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Deployment => "deployment",
            Category::Controller => "controller",
            Category::Simulation => "simulation",
            Category::Logging => "logging",
            Category::Build => "build",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Str,
    /// Non-negative integer.
    UInt,
    Bool,
    Seconds,
}

impl KeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Str => "string",
            KeyKind::UInt => "non-negative integer",
            KeyKind::Bool => "boolean",
            KeyKind::Seconds => "duration",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    pub key: &'static str,
    pub category: Category,
    pub kind: KeyKind,
    /// `null` is an accepted value.
    pub nullable: bool,
    /// Computed from other keys; never stored.
    pub derived: bool,
    pub description: &'static str,
}

const fn spec(
    key: &'static str,
    category: Category,
    kind: KeyKind,
    description: &'static str,
) -> KeySpec {
    KeySpec {
        key,
        category,
        kind,
        nullable: false,
        derived: false,
        description,
    }
}

impl KeySpec {
    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    /// Bring a declared value into the kind this key stores. Plain integers
    /// declared for duration keys become seconds; nothing else changes.
    pub fn normalize(&self, value: ConfigValue) -> ConfigValue {
        match (self.kind, value) {
            (KeyKind::Seconds, ConfigValue::Int(n)) if n >= 0 => ConfigValue::Seconds(n as u64),
            (_, value) => value,
        }
    }

    pub fn check(&self, value: &ConfigValue) -> ConfigResult<()> {
        let ok = match (self.kind, value) {
            (_, ConfigValue::Null) => self.nullable,
            (KeyKind::Str, ConfigValue::Str(_)) => true,
            (KeyKind::UInt, ConfigValue::Int(n)) => {
                if *n < 0 {
                    return Err(ConfigError::invalid_value(
                        self.key,
                        format!("must be non-negative, got {n}"),
                    ));
                }
                true
            }
            (KeyKind::Bool, ConfigValue::Bool(_)) => true,
            (KeyKind::Seconds, ConfigValue::Seconds(_)) => true,
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            let expected = if value.is_null() {
                format!("non-null {}", self.kind.as_str())
            } else {
                self.kind.as_str().to_string()
            };
            Err(ConfigError::type_mismatch(
                self.key,
                expected,
                value.kind().as_str(),
            ))
        }
    }

    /// Parse a raw override string (environment variable) by this key's kind.
    pub fn parse_raw(&self, raw: &str) -> ConfigResult<ConfigValue> {
        let trimmed = raw.trim();
        if self.nullable && matches!(trimmed.to_lowercase().as_str(), "none" | "null") {
            return Ok(ConfigValue::Null);
        }

        let value = match self.kind {
            KeyKind::Str => ConfigValue::Str(trimmed.to_string()),
            KeyKind::UInt => ConfigValue::Int(trimmed.parse::<i64>().map_err(|e| {
                ConfigError::invalid_value(self.key, format!("'{trimmed}' is not an integer: {e}"))
            })?),
            KeyKind::Bool => match trimmed.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => ConfigValue::Bool(true),
                "false" | "0" | "no" | "off" => ConfigValue::Bool(false),
                _ => {
                    return Err(ConfigError::invalid_value(
                        self.key,
                        format!("'{trimmed}' is not a boolean"),
                    ))
                }
            },
            KeyKind::Seconds => {
                let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
                ConfigValue::Seconds(digits.parse::<u64>().map_err(|e| {
                    ConfigError::invalid_value(
                        self.key,
                        format!("'{trimmed}' is not a number of seconds: {e}"),
                    )
                })?)
            }
        };

        self.check(&value)?;
        Ok(value)
    }
}

use Category::{Build, Controller, Deployment, Logging, Simulation};
use KeyKind::{Bool, Seconds, Str, UInt};

pub const SCHEMA: &[KeySpec] = &[
    // deployment
    spec("EC2_LOCATION", Deployment, Str, "EC2 region"),
    spec("UBUNTU_AMI", Deployment, Str, "stock Ubuntu machine image"),
    spec("NIMBUS_AMI", Deployment, Str, "machine image with nimbus preinstalled"),
    spec("KEY_NAME", Deployment, Str, "EC2 key-pair name"),
    spec("SECURITY_GROUP", Deployment, Str, "EC2 security group"),
    spec("CONTROLLER_INSTANCE_TYPE", Deployment, Str, "instance type of the controller"),
    spec("WORKER_INSTANCE_TYPE", Deployment, Str, "instance type of the workers"),
    spec("PLACEMENT", Deployment, Str, "availability zone").nullable(),
    spec("PLACEMENT_GROUP", Deployment, Str, "cluster placement group").nullable(),
    spec("PRIVATE_KEY_DIR", Deployment, Str, "directory holding the key-pair .pem file"),
    spec("PRIVATE_KEY", Deployment, Str, "PRIVATE_KEY_DIR + KEY_NAME + .pem").derived(),
    spec("CONTROLLER_NUM", Deployment, UInt, "number of controller instances"),
    spec("WORKER_NUM", Deployment, UInt, "number of worker instances"),
    spec("INSTANCE_NUM", Deployment, UInt, "CONTROLLER_NUM + WORKER_NUM").derived(),
    // controller
    spec("ASSIGNER_THREAD_NUM", Controller, UInt, "job assigner threads"),
    spec("BATCH_ASSIGN_NUM", Controller, UInt, "jobs assigned per batch"),
    spec("COMMAND_BATCH_SIZE", Controller, UInt, "commands sent per batch"),
    spec("DEACTIVATE_CONTROLLER_TEMPLATE", Controller, Bool, "disable controller templates"),
    spec("DEACTIVATE_COMPLEX_MEMOIZATION", Controller, Bool, "disable complex memoization"),
    spec("DEACTIVATE_BINDING_MEMOIZATION", Controller, Bool, "disable binding memoization"),
    spec("DEACTIVATE_WORKER_TEMPLATE", Controller, Bool, "disable worker templates"),
    spec("DEACTIVATE_MEGA_RCR_JOB", Controller, Bool, "disable mega RCR jobs"),
    spec("DEACTIVATE_DM_QUERY_CACHE", Controller, Bool, "disable data-manager query cache"),
    spec("ACTIVATE_LB", Controller, Bool, "enable load balancing"),
    spec("ACTIVATE_FT", Controller, Bool, "enable fault tolerance"),
    spec("LB_PERIOD", Controller, Seconds, "load-balancing period"),
    spec("FT_PERIOD", Controller, Seconds, "checkpoint period"),
    spec("FIRST_PORT", Controller, UInt, "first port of the cluster port range"),
    // worker / simulation
    spec("SIMULATION_SCALE", Simulation, UInt, "grid cells per axis"),
    spec("PART_X", Simulation, UInt, "partitions along x"),
    spec("PART_Y", Simulation, UInt, "partitions along y"),
    spec("PART_Z", Simulation, UInt, "partitions along z"),
    spec("PROJ_PART_X", Simulation, UInt, "projection partitions along x"),
    spec("PROJ_PART_Y", Simulation, UInt, "projection partitions along y"),
    spec("PROJ_PART_Z", Simulation, UInt, "projection partitions along z"),
    spec("FRAME_NUMBER", Simulation, UInt, "frames to simulate"),
    spec("OTHREAD_NUM", Simulation, UInt, "worker execution threads"),
    spec("ITERATION_BATCH", Simulation, UInt, "projection iterations per batch"),
    spec("MAX_ITERATION", Simulation, UInt, "projection iteration cap"),
    spec("NO_PROJ_BOTTLENECK", Simulation, Bool, "skip the projection bottleneck job"),
    spec("WRITE_PER_PART", Simulation, Bool, "write output per partition"),
    spec("RUN_WITH_TASKSET", Simulation, Bool, "pin workers with taskset"),
    spec("WORKER_TASKSET", Simulation, Str, "CPU list for taskset"),
    // logging
    spec("STD_OUT_LOG", Logging, Str, "launcher stdout log"),
    spec("LOAD_BALANCER_LOG", Logging, Str, "controller load-balancer log"),
    spec("SCHED_PER_ITER_STAT_LOG", Logging, Str, "controller per-iteration stats"),
    spec("WORKER_LB_LOG", Logging, Str, "worker load-balancer log"),
    spec("WORKER_FINAL_STAT_LOG", Logging, Str, "worker final timers"),
    spec("WORKER_PER_ITER_STAT_LOG", Logging, Str, "worker per-iteration timers"),
    spec("OUTPUT_PATH", Logging, Str, "directory for collected logs"),
    // build / path
    spec("SOURCE_NIMBUS_ROOT", Build, Str, "nimbus checkout on the launching host"),
    spec("EC2_NIMBUS_ROOT", Build, Str, "nimbus checkout on the instances"),
    spec("REL_APPLICATION_PATH", Build, Str, "application build dir, relative to root"),
    spec("REL_SCHEDULER_PATH", Build, Str, "scheduler dir, relative to root"),
    spec("REL_WORKER_PATH", Build, Str, "worker dir, relative to root"),
    spec("NIMBUS_LIB", Build, Str, "nimbus shared library"),
    spec("APPLICATION_LIB", Build, Str, "application shared library"),
    spec("SCHEDULER_BINARY", Build, Str, "controller binary"),
    spec("WORKER_BINARY", Build, Str, "worker binary"),
];

pub fn lookup(key: &str) -> Option<&'static KeySpec> {
    SCHEMA.iter().find(|spec| spec.key == key)
}

/// Keys every declaration has to provide.
pub fn required_keys() -> impl Iterator<Item = &'static KeySpec> {
    SCHEMA.iter().filter(|spec| !spec.derived)
}
