use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// Point-in-time view of one process. Metrics that could not be read are `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub user: Option<String>,
    pub cpu_percent: Option<f32>,
    pub memory_percent: Option<f32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    #[default]
    Cpu,
    Memory,
}

impl Resource {
    pub fn label(self) -> &'static str {
        match self {
            Resource::Cpu => "CPU",
            Resource::Memory => "MEM",
        }
    }

    pub fn other(self) -> Resource {
        match self {
            Resource::Cpu => Resource::Memory,
            Resource::Memory => Resource::Cpu,
        }
    }

    pub fn read(self, process: &ProcessInfo) -> Option<f32> {
        match self {
            Resource::Cpu => process.cpu_percent,
            Resource::Memory => process.memory_percent,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Cpu => f.write_str("cpu"),
            Resource::Memory => f.write_str("memory"),
        }
    }
}

/// Case-insensitive regex filter on process names.
pub fn name_filter(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| MonitorError::InvalidArgument(format!("invalid name pattern: {e}")))
}

/// Orders processes by `resource` descending, ties by ascending pid, and keeps the first `count`.
///
/// Processes without a reading for `resource` are dropped.
pub fn rank(
    processes: Vec<ProcessInfo>,
    resource: Resource,
    count: usize,
    filter: Option<&Regex>,
) -> Result<Vec<ProcessInfo>> {
    if count == 0 {
        return Err(MonitorError::InvalidArgument(
            "count must be greater than 0".to_string(),
        ));
    }

    let mut ranked: Vec<(f32, ProcessInfo)> = processes
        .into_iter()
        .filter(|p| filter.is_none_or(|re| re.is_match(&p.name)))
        .filter_map(|p| resource.read(&p).map(|value| (value, p)))
        .collect();

    ranked.sort_by(|(a_val, a), (b_val, b)| match b_val.total_cmp(a_val) {
        Ordering::Equal => a.pid.cmp(&b.pid),
        ord => ord,
    });
    ranked.truncate(count);

    Ok(ranked.into_iter().map(|(_, p)| p).collect())
}
