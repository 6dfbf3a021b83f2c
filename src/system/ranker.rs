use regex::Regex;

use super::process::{ProcessInfo, Resource, rank};
use super::provider::MetricsProvider;
use crate::error::{MonitorError, Result};

pub struct Ranker<P> {
    provider: P,
}

impl<P: MetricsProvider> Ranker<P> {
    pub fn new(provider: P) -> Self {
        Ranker { provider }
    }

    /// Returns the `count` heaviest processes by `resource` from one enumeration pass.
    pub fn top(
        &mut self,
        count: usize,
        resource: Resource,
        filter: Option<&Regex>,
    ) -> Result<Vec<ProcessInfo>> {
        if count == 0 {
            return Err(MonitorError::InvalidArgument(
                "count must be greater than 0".to_string(),
            ));
        }
        let processes = self.provider.processes()?;
        let visible = processes.len();
        let ranked = rank(processes, resource, count, filter)?;
        tracing::debug!(visible, returned = ranked.len(), %resource, "ranked processes");
        Ok(ranked)
    }
}
