//! Immutable configuration store for launching a nimbus simulation cluster.
//!
//! The store is built once from the embedded launch declaration, optionally
//! adjusted by named profiles, TOML overlays and `NIMBUS_*` environment
//! overrides, and is read-only afterwards. Share it as `Arc<ConfigurationStore>`.
//!
//! ```
//! use nimbus_config::ConfigurationStore;
//!
//! let store = ConfigurationStore::builder().build().unwrap();
//! let port: u16 = store.get("FIRST_PORT").unwrap();
//! assert_eq!(port, 5800);
//! assert_eq!(store.total_instance_count().unwrap(), 0);
//! ```

pub mod declaration;
pub mod derived;
pub mod models;
pub mod profile;
pub mod schema;
pub mod store;
pub mod validation;
pub mod value;

pub use declaration::{Declaration, DISABLED_TABLE_KEY, ENV_PREFIX};
pub use derived::{Derivation, DERIVATIONS};
pub use models::{
    BuildConfig, ClusterConfig, ControllerConfig, CpuSet, DeactivationFlags, DeploymentConfig,
    LogFilesConfig, PartitionGrid, SimulationConfig,
};
pub use profile::{ConfigProfile, ProfileRegistry, DEFAULT_PROFILE};
pub use schema::{Category, KeyKind, KeySpec, SCHEMA};
pub use store::{ConfigEntry, ConfigurationStore, ConfigurationStoreBuilder};
pub use validation::{ConfigValidator, ValidationUtils};
pub use value::{ConfigValue, FromConfigValue, ValueKind};

pub use nimbus_errors::{ConfigError, ConfigResult};
