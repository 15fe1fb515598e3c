use serde::{Deserialize, Serialize};

use crate::store::ConfigurationStore;
use crate::validation::{ConfigValidator, ValidationUtils};
use crate::ConfigResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub region: String,
    pub ubuntu_ami: String,
    pub nimbus_ami: String,
    pub key_name: String,
    pub security_group: String,
    pub controller_instance_type: String,
    pub worker_instance_type: String,
    pub placement: Option<String>,
    pub placement_group: Option<String>,
    pub private_key: String,
    pub controller_num: u64,
    pub worker_num: u64,
}

impl DeploymentConfig {
    pub fn from_store(store: &ConfigurationStore) -> ConfigResult<Self> {
        Ok(Self {
            region: store.get("EC2_LOCATION")?,
            ubuntu_ami: store.get("UBUNTU_AMI")?,
            nimbus_ami: store.get("NIMBUS_AMI")?,
            key_name: store.get("KEY_NAME")?,
            security_group: store.get("SECURITY_GROUP")?,
            controller_instance_type: store.get("CONTROLLER_INSTANCE_TYPE")?,
            worker_instance_type: store.get("WORKER_INSTANCE_TYPE")?,
            placement: store.get("PLACEMENT")?,
            placement_group: store.get("PLACEMENT_GROUP")?,
            private_key: store.private_key_path()?,
            controller_num: store.get("CONTROLLER_NUM")?,
            worker_num: store.get("WORKER_NUM")?,
        })
    }

    pub fn instance_num(&self) -> u64 {
        self.controller_num + self.worker_num
    }
}

impl ConfigValidator for DeploymentConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_region(&self.region, "deployment.region")?;
        ValidationUtils::validate_ami(&self.ubuntu_ami, "deployment.ubuntu_ami")?;
        ValidationUtils::validate_ami(&self.nimbus_ami, "deployment.nimbus_ami")?;
        ValidationUtils::validate_not_empty(&self.key_name, "deployment.key_name")?;
        ValidationUtils::validate_not_empty(&self.security_group, "deployment.security_group")?;
        ValidationUtils::validate_not_empty(
            &self.controller_instance_type,
            "deployment.controller_instance_type",
        )?;
        ValidationUtils::validate_not_empty(
            &self.worker_instance_type,
            "deployment.worker_instance_type",
        )?;
        ValidationUtils::validate_not_empty(&self.private_key, "deployment.private_key")?;

        // An availability zone is the region name plus a zone letter.
        if let Some(zone) = &self.placement {
            let in_region = zone
                .strip_prefix(self.region.as_str())
                .is_some_and(|suffix| suffix.len() == 1);
            if !in_region {
                return Err(crate::ConfigError::Validation(format!(
                    "deployment.placement {zone} is not a zone of {}",
                    self.region
                )));
            }
        }

        if let Some(group) = &self.placement_group {
            ValidationUtils::validate_not_empty(group, "deployment.placement_group")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DeploymentConfig {
        DeploymentConfig {
            region: "us-west-2".to_string(),
            ubuntu_ami: "ami-fa9cf1ca".to_string(),
            nimbus_ami: "ami-1f868b2f".to_string(),
            key_name: "omidm-sing-key-pair-us-west-2".to_string(),
            security_group: "nimbus_sg_uswest2".to_string(),
            controller_instance_type: "c3.4xlarge".to_string(),
            worker_instance_type: "c3.2xlarge".to_string(),
            placement: Some("us-west-2c".to_string()),
            placement_group: Some("nimbus-cluster".to_string()),
            private_key: "/home/omidm/.ssh/omidm-sing-key-pair-us-west-2.pem".to_string(),
            controller_num: 1,
            worker_num: 8,
        }
    }

    #[test]
    fn test_deployment_config_validation() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.instance_num(), 9);

        // placement outside the region
        let mut invalid_config = config.clone();
        invalid_config.placement = Some("us-west-1a".to_string());
        assert!(invalid_config.validate().is_err());

        // placement disabled is fine
        let mut disabled = config.clone();
        disabled.placement = None;
        disabled.placement_group = None;
        assert!(disabled.validate().is_ok());

        let mut invalid_config = config.clone();
        invalid_config.region = "moon-1".to_string();
        invalid_config.placement = None;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.nimbus_ami = "nimbus".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.key_name = "".to_string();
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_deployment_from_store() {
        let store = ConfigurationStore::builder().build().unwrap();
        let config = DeploymentConfig::from_store(&store).unwrap();
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.placement_group.as_deref(), Some("nimbus-cluster"));
        assert_eq!(config.instance_num(), store.total_instance_count().unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deployment_accepts_any_region_name() {
        let store = ConfigurationStore::builder()
            .overlay(
                crate::Declaration::new()
                    .set("EC2_LOCATION", "ca-central-1")
                    .set("PLACEMENT", crate::ConfigValue::Null),
            )
            .build()
            .unwrap();
        let config = DeploymentConfig::from_store(&store).unwrap();
        assert_eq!(config.region, "ca-central-1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deployment_counts_beyond_u32() {
        let store = ConfigurationStore::builder()
            .overlay(
                crate::Declaration::new()
                    .set("CONTROLLER_NUM", 1)
                    .set("WORKER_NUM", 5_000_000_000i64),
            )
            .build()
            .unwrap();
        let config = DeploymentConfig::from_store(&store).unwrap();
        assert_eq!(config.worker_num, 5_000_000_000);
        assert_eq!(config.instance_num(), 5_000_000_001);
        assert_eq!(config.instance_num(), store.total_instance_count().unwrap());
    }
}
