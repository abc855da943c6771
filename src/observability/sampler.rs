//! Host CPU and memory sampling.
//!
//! Point samples taken at flush time; nothing is smoothed between calls.

use std::sync::{Mutex, PoisonError};

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use thiserror::Error;

/// Host utilization at one flush tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSample {
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
}

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("host metric unavailable: {0}")]
    Unavailable(&'static str),
}

/// Source of host utilization samples.
pub trait SystemSampler: Send + Sync {
    fn sample(&self) -> Result<SystemSample, SamplerError>;
}

/// Samples the local host through `sysinfo`.
pub struct HostSampler {
    sys: Mutex<System>,
}

impl HostSampler {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        Self { sys: Mutex::new(sys) }
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler for HostSampler {
    fn sample(&self) -> Result<SystemSample, SamplerError> {
        let mut sys = self.sys.lock().unwrap_or_else(PoisonError::into_inner);
        sys.refresh_memory();

        let cores = sys.cpus().len();
        let load = System::load_average().one;
        let cpu_usage_percent =
            cpu_percent(load, cores).ok_or(SamplerError::Unavailable("logical core count"))?;
        let memory_usage_percent = memory_percent(sys.total_memory(), sys.free_memory())
            .ok_or(SamplerError::Unavailable("total memory"))?;

        Ok(SystemSample { cpu_usage_percent, memory_usage_percent })
    }
}

/// One-minute load average per logical core, as a percentage.
///
/// The ratio is rounded to two decimals before scaling, so results move in
/// whole-percent steps.
pub fn cpu_percent(load_one: f64, cores: usize) -> Option<f64> {
    if cores == 0 || !load_one.is_finite() {
        return None;
    }
    Some((load_one / cores as f64 * 100.0).round())
}

/// Used share of physical memory as a percentage, rounded to two decimals.
pub fn memory_percent(total: u64, free: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(free) as f64;
    Some(round2(used / total as f64 * 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
