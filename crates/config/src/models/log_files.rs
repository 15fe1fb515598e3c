use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::ConfigurationStore;
use crate::validation::{ConfigValidator, ValidationUtils};
use crate::ConfigResult;

/// Log files the controller and workers write, collected under `output_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogFilesConfig {
    pub std_out_log: String,
    pub load_balancer_log: String,
    pub sched_per_iter_stat_log: String,
    pub worker_lb_log: String,
    pub worker_final_stat_log: String,
    pub worker_per_iter_stat_log: String,
    pub output_path: String,
}

impl LogFilesConfig {
    pub fn from_store(store: &ConfigurationStore) -> ConfigResult<Self> {
        Ok(Self {
            std_out_log: store.get("STD_OUT_LOG")?,
            load_balancer_log: store.get("LOAD_BALANCER_LOG")?,
            sched_per_iter_stat_log: store.get("SCHED_PER_ITER_STAT_LOG")?,
            worker_lb_log: store.get("WORKER_LB_LOG")?,
            worker_final_stat_log: store.get("WORKER_FINAL_STAT_LOG")?,
            worker_per_iter_stat_log: store.get("WORKER_PER_ITER_STAT_LOG")?,
            output_path: store.get("OUTPUT_PATH")?,
        })
    }

    fn file_names(&self) -> [(&str, &'static str); 6] {
        [
            (self.std_out_log.as_str(), "log_files.std_out_log"),
            (self.load_balancer_log.as_str(), "log_files.load_balancer_log"),
            (self.sched_per_iter_stat_log.as_str(), "log_files.sched_per_iter_stat_log"),
            (self.worker_lb_log.as_str(), "log_files.worker_lb_log"),
            (self.worker_final_stat_log.as_str(), "log_files.worker_final_stat_log"),
            (self.worker_per_iter_stat_log.as_str(), "log_files.worker_per_iter_stat_log"),
        ]
    }

    /// Where a collected log file lands, e.g. `output/ec2_log.txt`.
    pub fn collected_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(&self.output_path).join(file_name)
    }
}

impl ConfigValidator for LogFilesConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.output_path, "log_files.output_path")?;
        for (name, field) in self.file_names() {
            ValidationUtils::validate_not_empty(name, field)?;
            if name.contains('/') {
                return Err(crate::ConfigError::Validation(format!(
                    "{field} must be a file name, not a path: {name}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_files_from_store() {
        let store = ConfigurationStore::builder().build().unwrap();
        let config = LogFilesConfig::from_store(&store).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.std_out_log, "ec2_log.txt");
        assert_eq!(
            config.collected_path(&config.worker_final_stat_log),
            PathBuf::from("output/time_per_thread.txt")
        );
    }

    #[test]
    fn test_log_files_validation() {
        let store = ConfigurationStore::builder().build().unwrap();
        let config = LogFilesConfig::from_store(&store).unwrap();

        let mut invalid_config = config.clone();
        invalid_config.worker_lb_log = "".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.std_out_log = "logs/ec2_log.txt".to_string();
        assert!(invalid_config.validate().is_err());
    }
}
