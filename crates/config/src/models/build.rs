use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::ConfigurationStore;
use crate::validation::{ConfigValidator, ValidationUtils};
use crate::ConfigResult;

/// Source and install layout of the nimbus binaries.
///
/// Roots may start with `~`; paths built here are left unexpanded because
/// the home directory differs between the launching host and the instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub source_nimbus_root: String,
    pub ec2_nimbus_root: String,
    pub rel_application_path: String,
    pub rel_scheduler_path: String,
    pub rel_worker_path: String,
    pub nimbus_lib: String,
    pub application_lib: String,
    pub scheduler_binary: String,
    pub worker_binary: String,
}

impl BuildConfig {
    pub fn from_store(store: &ConfigurationStore) -> ConfigResult<Self> {
        Ok(Self {
            source_nimbus_root: store.get("SOURCE_NIMBUS_ROOT")?,
            ec2_nimbus_root: store.get("EC2_NIMBUS_ROOT")?,
            rel_application_path: store.get("REL_APPLICATION_PATH")?,
            rel_scheduler_path: store.get("REL_SCHEDULER_PATH")?,
            rel_worker_path: store.get("REL_WORKER_PATH")?,
            nimbus_lib: store.get("NIMBUS_LIB")?,
            application_lib: store.get("APPLICATION_LIB")?,
            scheduler_binary: store.get("SCHEDULER_BINARY")?,
            worker_binary: store.get("WORKER_BINARY")?,
        })
    }

    pub fn source_application_dir(&self) -> PathBuf {
        PathBuf::from(&self.source_nimbus_root).join(&self.rel_application_path)
    }

    pub fn source_application_lib(&self) -> PathBuf {
        self.source_application_dir().join(&self.application_lib)
    }

    pub fn ec2_scheduler_dir(&self) -> PathBuf {
        PathBuf::from(&self.ec2_nimbus_root).join(&self.rel_scheduler_path)
    }

    pub fn ec2_worker_dir(&self) -> PathBuf {
        PathBuf::from(&self.ec2_nimbus_root).join(&self.rel_worker_path)
    }

    pub fn ec2_scheduler_binary(&self) -> PathBuf {
        self.ec2_scheduler_dir().join(&self.scheduler_binary)
    }

    pub fn ec2_worker_binary(&self) -> PathBuf {
        self.ec2_worker_dir().join(&self.worker_binary)
    }

    /// The worker loads the application library from its own directory.
    pub fn ec2_application_lib(&self) -> PathBuf {
        self.ec2_worker_dir().join(&self.application_lib)
    }
}

impl ConfigValidator for BuildConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.source_nimbus_root, "build.source_nimbus_root")?;
        ValidationUtils::validate_not_empty(&self.ec2_nimbus_root, "build.ec2_nimbus_root")?;

        for (path, field) in [
            (&self.rel_application_path, "build.rel_application_path"),
            (&self.rel_scheduler_path, "build.rel_scheduler_path"),
            (&self.rel_worker_path, "build.rel_worker_path"),
        ] {
            ValidationUtils::validate_not_empty(path, field)?;
            if path.starts_with('/') || path.starts_with('~') {
                return Err(crate::ConfigError::Validation(format!(
                    "{field} must be relative to the nimbus root: {path}"
                )));
            }
        }

        for (name, field) in [
            (&self.nimbus_lib, "build.nimbus_lib"),
            (&self.application_lib, "build.application_lib"),
        ] {
            if !name.ends_with(".so") {
                return Err(crate::ConfigError::Validation(format!(
                    "{field} must be a shared library (.so): {name}"
                )));
            }
        }

        ValidationUtils::validate_not_empty(&self.scheduler_binary, "build.scheduler_binary")?;
        ValidationUtils::validate_not_empty(&self.worker_binary, "build.worker_binary")?;
        Ok(())
    }
}
