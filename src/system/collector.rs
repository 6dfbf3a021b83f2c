use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use sysinfo::{
    Disks, MINIMUM_CPU_UPDATE_INTERVAL, Networks, ProcessRefreshKind, ProcessesToUpdate, System,
    UpdateKind, Users,
};

use super::process::ProcessInfo;
use super::provider::MetricsProvider;
use super::snapshot::{DiskUsage, MemoryUsage, NetworkCounters, Snapshot, percent_of};
use crate::error::{MonitorError, Result};

/// `sysinfo`-backed metrics provider.
pub struct Collector {
    sys: System,
    users: Users,
    mount_point: PathBuf,
    last_cpu_refresh: Instant,
    last_process_refresh: Option<Instant>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(Path::new("/"))
    }
}

impl Collector {
    pub fn new(mount_point: &Path) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        Collector {
            sys,
            users: Users::new_with_refreshed_list(),
            mount_point: mount_point.to_path_buf(),
            last_cpu_refresh: Instant::now(),
            last_process_refresh: None,
        }
    }

    // CPU usage is computed between two refreshes; too short a gap yields garbage.
    fn settle_since(last: Instant) {
        let elapsed = last.elapsed();
        if elapsed < MINIMUM_CPU_UPDATE_INTERVAL {
            std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL - elapsed);
        }
    }

    fn refresh_cpu(&mut self) {
        Self::settle_since(self.last_cpu_refresh);
        self.sys.refresh_cpu_usage();
        self.last_cpu_refresh = Instant::now();
    }

    fn refresh_processes(&mut self) {
        let kind = ProcessRefreshKind::nothing()
            .with_memory()
            .with_cpu()
            .with_user(UpdateKind::OnlyIfNotSet);

        let last = match self.last_process_refresh {
            Some(last) => last,
            None => {
                self.sys
                    .refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
                Instant::now()
            }
        };
        Self::settle_since(last);
        self.sys
            .refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
        self.last_process_refresh = Some(Instant::now());
    }

    fn disk_usage(&self) -> Option<DiskUsage> {
        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .iter()
            .find(|d| d.mount_point() == self.mount_point.as_path());
        match disk {
            Some(disk) => Some(DiskUsage::new(
                self.mount_point.clone(),
                disk.total_space(),
                disk.available_space(),
            )),
            None => {
                tracing::debug!(mount_point = %self.mount_point.display(), "mount point not found");
                None
            }
        }
    }

    fn network_counters() -> NetworkCounters {
        let networks = Networks::new_with_refreshed_list();
        networks
            .iter()
            .fold(NetworkCounters::default(), |acc, (_, data)| NetworkCounters {
                bytes_sent: acc.bytes_sent.saturating_add(data.total_transmitted()),
                bytes_recv: acc.bytes_recv.saturating_add(data.total_received()),
            })
    }

    fn cpu_count(&self) -> usize {
        self.sys.cpus().len().max(1)
    }
}

impl MetricsProvider for Collector {
    fn capture(&mut self) -> Result<Snapshot> {
        let _span = tracing::debug_span!("collector.capture").entered();

        self.refresh_cpu();
        self.sys.refresh_memory();

        let total_memory = self.sys.total_memory();
        if total_memory == 0 {
            return Err(MonitorError::PermissionDenied(
                "memory counters are unreadable".to_string(),
            ));
        }

        Ok(Snapshot {
            timestamp: Local::now(),
            cpu_percent: self.sys.global_cpu_usage().clamp(0.0, 100.0),
            cpu_count: self.sys.cpus().len(),
            memory: MemoryUsage::new(
                total_memory,
                self.sys.used_memory(),
                self.sys.available_memory(),
            ),
            disk: self.disk_usage(),
            network: Self::network_counters(),
        })
    }

    fn processes(&mut self) -> Result<Vec<ProcessInfo>> {
        let _span = tracing::debug_span!("collector.processes").entered();

        self.sys.refresh_memory();
        self.refresh_processes();

        let total_memory = self.sys.total_memory();
        let cpus = self.cpu_count() as f32;

        let processes = self
            .sys
            .processes()
            .iter()
            .map(|(pid, process)| {
                let user = process
                    .user_id()
                    .and_then(|uid| self.users.get_user_by_id(uid))
                    .map(|u| u.name().to_string());
                let memory_percent =
                    (total_memory > 0).then(|| percent_of(process.memory(), total_memory));

                ProcessInfo {
                    pid: pid.as_u32(),
                    name: process.name().to_string_lossy().to_string(),
                    user,
                    cpu_percent: Some((process.cpu_usage() / cpus).clamp(0.0, 100.0)),
                    memory_percent,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = processes.len(), "enumerated processes");
        Ok(processes)
    }
}
