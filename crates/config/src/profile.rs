use std::collections::HashMap;

use crate::declaration::Declaration;
use crate::value::ConfigValue;
use crate::{ConfigError, ConfigResult};

/// Profile the embedded declaration corresponds to.
pub const DEFAULT_PROFILE: &str = "us-west-2";

/// Named set of overrides applied on top of the embedded declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigProfile {
    pub name: String,
    pub description: String,
    pub overrides: Declaration,
}

impl ConfigProfile {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            overrides: Declaration::new(),
        }
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.overrides.push(key, value);
        self
    }

    /// Northern California deployment.
    pub fn us_west_1() -> Self {
        Self::new("us-west-1", "US West (Northern California)")
            .with_override("EC2_LOCATION", "us-west-1")
            .with_override("NIMBUS_AMI", "ami-50201815")
            .with_override("UBUNTU_AMI", "ami-660c3023")
            .with_override("KEY_NAME", "omidm-sing-key-pair-us-west-1")
            .with_override("SECURITY_GROUP", "nimbus_sg_uswest1")
            .with_override("CONTROLLER_INSTANCE_TYPE", "c3.xlarge")
            .with_override("WORKER_INSTANCE_TYPE", "c3.xlarge")
            .with_override("PLACEMENT", ConfigValue::Null)
            .with_override("PLACEMENT_GROUP", ConfigValue::Null)
    }

    /// Oregon deployment. Matches the embedded declaration.
    pub fn us_west_2() -> Self {
        Self::new(DEFAULT_PROFILE, "US West (Oregon)")
    }

    /// Workers run from a PhysBAM checkout instead of the nimbus tree.
    pub fn physbam_layout() -> Self {
        Self::new("physbam-layout", "worker binaries from a PhysBAM checkout")
            .with_override("EC2_NIMBUS_ROOT", "~/physbam/")
            .with_override("REL_WORKER_PATH", "Projects/Water/")
    }

    /// Previous nimbus machine image in us-west-2.
    pub fn legacy_ami() -> Self {
        Self::new("legacy-ami", "previous nimbus image in us-west-2")
            .with_override("NIMBUS_AMI", "ami-9996aea9")
    }
}

/// Registry of selectable profiles.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<String, ConfigProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn add_profile(mut self, profile: ConfigProfile) -> Self {
        self.profiles.insert(profile.name.clone(), profile);
        self
    }

    pub fn get_profile(&self, name: &str) -> ConfigResult<&ConfigProfile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }

    /// Sorted profile names.
    pub fn list_profiles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up several profiles, failing on the first unknown name.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> ConfigResult<Vec<&ConfigProfile>> {
        names
            .iter()
            .map(|name| self.get_profile(name.as_ref()))
            .collect()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
            .add_profile(ConfigProfile::us_west_2())
            .add_profile(ConfigProfile::us_west_1())
            .add_profile(ConfigProfile::physbam_layout())
            .add_profile(ConfigProfile::legacy_ami())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = ProfileRegistry::default();
        assert_eq!(
            registry.list_profiles(),
            vec!["legacy-ami", "physbam-layout", "us-west-1", "us-west-2"]
        );
        assert!(registry.get_profile(DEFAULT_PROFILE).unwrap().overrides.is_empty());
    }

    #[test]
    fn test_unknown_profile() {
        let registry = ProfileRegistry::default();
        assert!(matches!(
            registry.get_profile("eu-west-1"),
            Err(ConfigError::UnknownProfile(name)) if name == "eu-west-1"
        ));
        assert!(registry.resolve(&["us-west-1", "nope"]).is_err());
    }

    #[test]
    fn test_resolve_keeps_order() {
        let registry = ProfileRegistry::default();
        let profiles = registry.resolve(&["us-west-1", "physbam-layout"]).unwrap();
        let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["us-west-1", "physbam-layout"]);
    }

    #[test]
    fn test_us_west_1_disables_placement() {
        let resolved = ConfigProfile::us_west_1().overrides.resolve();
        assert_eq!(resolved["PLACEMENT_GROUP"], ConfigValue::Null);
        assert_eq!(resolved["PLACEMENT"], ConfigValue::Null);
        assert_eq!(resolved["EC2_LOCATION"], ConfigValue::from("us-west-1"));
    }

    #[test]
    fn test_custom_profile() {
        let registry = ProfileRegistry::new().add_profile(
            ConfigProfile::new("big", "large run").with_override("WORKER_NUM", 100),
        );
        let profile = registry.get_profile("big").unwrap();
        assert_eq!(profile.overrides.resolve()["WORKER_NUM"], ConfigValue::Int(100));
    }
}
