use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One timestamped capture of system-wide resource metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Local>,
    /// Aggregate over all logical CPUs, 0-100.
    pub cpu_percent: f32,
    pub cpu_count: usize,
    pub memory: MemoryUsage,
    /// `None` when the configured mount point could not be read.
    pub disk: Option<DiskUsage>,
    pub network: NetworkCounters,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub mount_point: PathBuf,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f32,
}

/// Cumulative counters summed over all interfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

pub fn percent_of(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        0.0
    } else {
        ((part as f64 / whole as f64) * 100.0) as f32
    }
}

impl MemoryUsage {
    pub fn new(total: u64, used: u64, available: u64) -> Self {
        MemoryUsage {
            total,
            used,
            available,
            percent: percent_of(used, total),
        }
    }
}

impl DiskUsage {
    pub fn new(mount_point: PathBuf, total: u64, available: u64) -> Self {
        let used = total.saturating_sub(available);
        DiskUsage {
            mount_point,
            total,
            used,
            free: available,
            percent: percent_of(used, total),
        }
    }
}
