use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::ConfigurationStore;
use crate::validation::{ConfigValidator, ValidationUtils};
use crate::{ConfigError, ConfigResult};

/// Spatial decomposition of the simulation domain along three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionGrid {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

impl PartitionGrid {
    fn from_store(store: &ConfigurationStore, prefix: &str) -> ConfigResult<Self> {
        Ok(Self {
            x: store.get(&format!("{prefix}PART_X"))?,
            y: store.get(&format!("{prefix}PART_Y"))?,
            z: store.get(&format!("{prefix}PART_Z"))?,
        })
    }

    /// Number of partitions, `None` if the product overflows.
    pub fn total(&self) -> Option<u64> {
        self.x.checked_mul(self.y)?.checked_mul(self.z)
    }

    fn validate(&self, field_name: &str, scale: u64) -> ConfigResult<()> {
        for (axis, parts) in [("x", self.x), ("y", self.y), ("z", self.z)] {
            ValidationUtils::validate_count(parts, &format!("{field_name}.{axis}"), scale)?;
        }
        Ok(())
    }
}

impl fmt::Display for PartitionGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Highest CPU id accepted in a taskset list.
pub const MAX_CPU_ID: usize = 4095;

/// CPU list in taskset syntax, e.g. `0-3,8-11`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSet {
    raw: String,
    cpus: Vec<usize>,
}

impl CpuSet {
    pub fn cpus(&self) -> &[usize] {
        &self.cpus
    }

    pub fn len(&self) -> usize {
        self.cpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpus.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for CpuSet {
    type Err = ConfigError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::invalid_value("WORKER_TASKSET", reason);
        let parse_cpu = |s: &str| -> ConfigResult<usize> {
            let cpu = s
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(format!("'{s}' is not a CPU number")))?;
            if cpu > MAX_CPU_ID {
                return Err(invalid(format!("CPU {cpu} is above {MAX_CPU_ID}")));
            }
            Ok(cpu)
        };

        let mut cpus = Vec::new();
        for part in spec.split(',').filter(|p| !p.trim().is_empty()) {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_cpu(start)?, parse_cpu(end)?);
                    if start > end {
                        return Err(invalid(format!("range {part} is reversed")));
                    }
                    cpus.extend(start..=end);
                }
                None => cpus.push(parse_cpu(part)?),
            }
        }
        cpus.sort_unstable();
        cpus.dedup();

        Ok(Self {
            raw: spec.to_string(),
            cpus,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub scale: u64,
    pub partitions: PartitionGrid,
    pub projection_partitions: PartitionGrid,
    pub frame_number: u64,
    pub othread_num: u64,
    pub iteration_batch: u64,
    pub max_iteration: u64,
    pub no_proj_bottleneck: bool,
    pub write_per_part: bool,
    pub run_with_taskset: bool,
    pub worker_taskset: CpuSet,
}

impl SimulationConfig {
    pub fn from_store(store: &ConfigurationStore) -> ConfigResult<Self> {
        let taskset: String = store.get("WORKER_TASKSET")?;
        Ok(Self {
            scale: store.get("SIMULATION_SCALE")?,
            partitions: PartitionGrid::from_store(store, "")?,
            projection_partitions: PartitionGrid::from_store(store, "PROJ_")?,
            frame_number: store.get("FRAME_NUMBER")?,
            othread_num: store.get("OTHREAD_NUM")?,
            iteration_batch: store.get("ITERATION_BATCH")?,
            max_iteration: store.get("MAX_ITERATION")?,
            no_proj_bottleneck: store.get("NO_PROJ_BOTTLENECK")?,
            write_per_part: store.get("WRITE_PER_PART")?,
            run_with_taskset: store.get("RUN_WITH_TASKSET")?,
            worker_taskset: taskset.parse()?,
        })
    }
}

impl ConfigValidator for SimulationConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_count(self.scale, "simulation.scale", 1 << 20)?;
        self.partitions.validate("simulation.partitions", self.scale)?;
        self.projection_partitions
            .validate("simulation.projection_partitions", self.scale)?;
        ValidationUtils::validate_count(self.frame_number, "simulation.frame_number", 1 << 20)?;
        ValidationUtils::validate_count(self.othread_num, "simulation.othread_num", 1024)?;
        ValidationUtils::validate_count(
            self.iteration_batch,
            "simulation.iteration_batch",
            self.max_iteration.max(1),
        )?;
        ValidationUtils::validate_count(self.max_iteration, "simulation.max_iteration", 1 << 20)?;

        if self.run_with_taskset && self.worker_taskset.is_empty() {
            return Err(ConfigError::Validation(
                "simulation.worker_taskset cannot be empty when running with taskset".to_string(),
            ));
        }

        Ok(())
    }
}
