use serde::{Deserialize, Serialize};

use super::{BuildConfig, ControllerConfig, DeploymentConfig, LogFilesConfig, SimulationConfig};
use crate::store::ConfigurationStore;
use crate::validation::ConfigValidator;
use crate::ConfigResult;

/// Typed view of the whole launch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub deployment: DeploymentConfig,
    pub controller: ControllerConfig,
    pub simulation: SimulationConfig,
    pub log_files: LogFilesConfig,
    pub build: BuildConfig,
}

impl ClusterConfig {
    pub fn from_store(store: &ConfigurationStore) -> ConfigResult<Self> {
        Ok(Self {
            deployment: DeploymentConfig::from_store(store)?,
            controller: ControllerConfig::from_store(store)?,
            simulation: SimulationConfig::from_store(store)?,
            log_files: LogFilesConfig::from_store(store)?,
            build: BuildConfig::from_store(store)?,
        })
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ConfigValidator for ClusterConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.deployment.validate()?;
        self.controller.validate()?;
        self.simulation.validate()?;
        self.log_files.validate()?;
        self.build.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_config_default() {
        let store = ConfigurationStore::builder().build().unwrap();
        let config = ClusterConfig::from_store(&store).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.deployment.worker_num, 0);
        assert_eq!(config.controller.first_port, 5800);
        assert_eq!(config.simulation.max_iteration, 100);
        assert_eq!(config.log_files.output_path, "output/");
        assert_eq!(config.build.worker_binary, "worker");
    }

    #[test]
    fn test_cluster_config_every_profile_validates() {
        for profile in ["us-west-1", "us-west-2", "physbam-layout", "legacy-ami"] {
            let store = ConfigurationStore::builder().profile(profile).build().unwrap();
            let config = ClusterConfig::from_store(&store).unwrap();
            assert!(config.validate().is_ok(), "profile {profile} failed");
        }
    }

    #[test]
    fn test_cluster_config_serialization() {
        let store = ConfigurationStore::builder().build().unwrap();
        let config = ClusterConfig::from_store(&store).unwrap();
        let serialized = config.to_json().expect("Failed to serialize");
        let deserialized: ClusterConfig =
            serde_json::from_str(&serialized).expect("Failed to deserialize");
        assert_eq!(config, deserialized);
    }
}
