use std::time::Duration;

use crate::{ConfigError, ConfigResult};

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that a port number is valid
    pub fn validate_port(port: u16, field_name: &str) -> ConfigResult<()> {
        if port == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} cannot be 0"
            )));
        }
        Ok(())
    }

    /// Validate that a count is positive and not above `max`
    pub fn validate_count(count: u64, field_name: &str, max: u64) -> ConfigResult<()> {
        if count == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > max {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to {max}"
            )));
        }
        Ok(())
    }

    /// Validate that a period is positive
    pub fn validate_period(period: Duration, field_name: &str) -> ConfigResult<()> {
        if period.is_zero() {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0 seconds"
            )));
        }
        Ok(())
    }

    /// Validate an EC2 machine image identifier (`ami-` followed by hex digits)
    pub fn validate_ami(ami: &str, field_name: &str) -> ConfigResult<()> {
        let valid = ami
            .strip_prefix("ami-")
            .is_some_and(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(ConfigError::Validation(format!(
                "{field_name} is not a machine image id: {ami}"
            )));
        }
        Ok(())
    }

    /// Validate an EC2 region name such as `us-west-2` or `us-gov-east-1`
    pub fn validate_region(region: &str, field_name: &str) -> ConfigResult<()> {
        let mut parts: Vec<&str> = region.split('-').collect();
        if parts.len() == 4 && parts[1] == "gov" {
            parts.remove(1);
        }
        let valid = match parts.as_slice() {
            [country, area, number] => {
                country.len() == 2
                    && country.chars().all(|c| c.is_ascii_lowercase())
                    && !area.is_empty()
                    && area.chars().all(|c| c.is_ascii_lowercase())
                    && !number.is_empty()
                    && number.chars().all(|c| c.is_ascii_digit())
            }
            _ => false,
        };
        if !valid {
            return Err(ConfigError::Validation(format!(
                "{field_name} is not a region name: {region}"
            )));
        }
        Ok(())
    }
}
