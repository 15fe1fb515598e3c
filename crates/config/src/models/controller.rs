use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::ConfigurationStore;
use crate::validation::{ConfigValidator, ValidationUtils};
use crate::ConfigResult;

/// Optimizations the controller can be told to switch off. All `false` means
/// every optimization is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationFlags {
    pub controller_template: bool,
    pub complex_memoization: bool,
    pub binding_memoization: bool,
    pub worker_template: bool,
    pub mega_rcr_job: bool,
    pub dm_query_cache: bool,
}

impl DeactivationFlags {
    /// Keys of the optimizations that are switched off.
    pub fn deactivated(&self) -> Vec<&'static str> {
        [
            (self.controller_template, "DEACTIVATE_CONTROLLER_TEMPLATE"),
            (self.complex_memoization, "DEACTIVATE_COMPLEX_MEMOIZATION"),
            (self.binding_memoization, "DEACTIVATE_BINDING_MEMOIZATION"),
            (self.worker_template, "DEACTIVATE_WORKER_TEMPLATE"),
            (self.mega_rcr_job, "DEACTIVATE_MEGA_RCR_JOB"),
            (self.dm_query_cache, "DEACTIVATE_DM_QUERY_CACHE"),
        ]
        .into_iter()
        .filter_map(|(set, key)| set.then_some(key))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub assigner_thread_num: u64,
    pub batch_assign_num: u64,
    pub command_batch_size: u64,
    pub deactivate: DeactivationFlags,
    pub activate_lb: bool,
    pub activate_ft: bool,
    pub lb_period: Duration,
    pub ft_period: Duration,
    pub first_port: u16,
}

impl ControllerConfig {
    pub fn from_store(store: &ConfigurationStore) -> ConfigResult<Self> {
        Ok(Self {
            assigner_thread_num: store.get("ASSIGNER_THREAD_NUM")?,
            batch_assign_num: store.get("BATCH_ASSIGN_NUM")?,
            command_batch_size: store.get("COMMAND_BATCH_SIZE")?,
            deactivate: DeactivationFlags {
                controller_template: store.get("DEACTIVATE_CONTROLLER_TEMPLATE")?,
                complex_memoization: store.get("DEACTIVATE_COMPLEX_MEMOIZATION")?,
                binding_memoization: store.get("DEACTIVATE_BINDING_MEMOIZATION")?,
                worker_template: store.get("DEACTIVATE_WORKER_TEMPLATE")?,
                mega_rcr_job: store.get("DEACTIVATE_MEGA_RCR_JOB")?,
                dm_query_cache: store.get("DEACTIVATE_DM_QUERY_CACHE")?,
            },
            activate_lb: store.get("ACTIVATE_LB")?,
            activate_ft: store.get("ACTIVATE_FT")?,
            lb_period: store.get("LB_PERIOD")?,
            ft_period: store.get("FT_PERIOD")?,
            first_port: store.get("FIRST_PORT")?,
        })
    }
}

impl ConfigValidator for ControllerConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_count(
            self.assigner_thread_num,
            "controller.assigner_thread_num",
            1024,
        )?;
        ValidationUtils::validate_count(
            self.batch_assign_num,
            "controller.batch_assign_num",
            1_000_000,
        )?;
        ValidationUtils::validate_count(
            self.command_batch_size,
            "controller.command_batch_size",
            1_000_000,
        )?;
        ValidationUtils::validate_port(self.first_port, "controller.first_port")?;

        if self.activate_lb {
            ValidationUtils::validate_period(self.lb_period, "controller.lb_period")?;
        }
        if self.activate_ft {
            ValidationUtils::validate_period(self.ft_period, "controller.ft_period")?;
        }

        Ok(())
    }
}
