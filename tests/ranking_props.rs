use proptest::prelude::*;
use sysmon::error::{MonitorError, Result};
use sysmon::system::process::{ProcessInfo, Resource, rank};
use sysmon::system::provider::MetricsProvider;
use sysmon::system::sampler::{SamplePlan, Sampler};
use sysmon::system::snapshot::{MemoryUsage, NetworkCounters, Snapshot};
use tokio::sync::watch;

fn make_processes(metrics: &[(u32, Option<u8>, Option<u8>)]) -> Vec<ProcessInfo> {
    metrics
        .iter()
        .map(|&(pid, cpu, mem)| ProcessInfo {
            pid,
            name: format!("p{pid}"),
            user: None,
            // Coarse values so ties are common.
            cpu_percent: cpu.map(|c| f32::from(c % 10)),
            memory_percent: mem.map(|m| f32::from(m % 10)),
        })
        .collect()
}

fn resource_strategy() -> impl Strategy<Value = Resource> {
    prop_oneof![Just(Resource::Cpu), Just(Resource::Memory)]
}

struct Immediate;

impl MetricsProvider for Immediate {
    fn capture(&mut self) -> Result<Snapshot> {
        Ok(Snapshot {
            timestamp: chrono::Local::now(),
            cpu_percent: 0.0,
            cpu_count: 1,
            memory: MemoryUsage::new(1, 1, 0),
            disk: None,
            network: NetworkCounters::default(),
        })
    }

    fn processes(&mut self) -> Result<Vec<ProcessInfo>> {
        Err(MonitorError::PermissionDenied("unused".to_string()))
    }
}

proptest! {
    #[test]
    fn ranking_is_descending_with_ascending_pid_ties(
        metrics in prop::collection::btree_map(1u32..10_000, (any::<Option<u8>>(), any::<Option<u8>>()), 0..80),
        count in 1usize..100,
        resource in resource_strategy(),
    ) {
        let flat: Vec<_> = metrics.iter().map(|(&pid, &(c, m))| (pid, c, m)).collect();
        let processes = make_processes(&flat);
        let readable = processes.iter().filter(|p| resource.read(p).is_some()).count();

        let ranked = rank(processes, resource, count, None).unwrap();

        prop_assert_eq!(ranked.len(), readable.min(count));
        for pair in ranked.windows(2) {
            let a = resource.read(&pair[0]).unwrap();
            let b = resource.read(&pair[1]).unwrap();
            prop_assert!(a >= b, "not descending: {} then {}", a, b);
            if a == b {
                prop_assert!(pair[0].pid < pair[1].pid, "tie not ordered by pid");
            }
        }
    }

    #[test]
    fn count_above_visible_returns_everything_readable(
        metrics in prop::collection::btree_map(1u32..1_000, any::<u8>(), 0..30),
    ) {
        let flat: Vec<_> = metrics.iter().map(|(&pid, &c)| (pid, Some(c), Some(c))).collect();
        let processes = make_processes(&flat);
        let total = processes.len();
        let ranked = rank(processes, Resource::Memory, total + 5, None).unwrap();
        prop_assert_eq!(ranked.len(), total);
    }

    #[test]
    fn session_length_follows_capture_schedule(duration in 0u32..60, interval in 1u32..15) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let plan = SamplePlan::new(f64::from(duration), f64::from(interval)).unwrap();

        let len = runtime.block_on(async {
            let (_tx, mut rx) = watch::channel(false);
            Sampler::new(Immediate).run(&plan, &mut rx, |_| {}).await.snapshots.len()
        });

        prop_assert_eq!(len as u32, duration / interval + 1);
        if duration % interval == 0 {
            prop_assert_eq!(len as u32, duration.div_ceil(interval) + 1);
        }
        if interval > duration {
            prop_assert_eq!(len, 1);
        }
    }
}
