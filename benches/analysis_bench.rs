use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::io::Cursor;
use sysmon::analysis::logfile::LogAnalyzer;
use sysmon::config::LogConfig;
use sysmon::system::process::{ProcessInfo, Resource, rank};

fn make_log(lines: usize) -> String {
    (0..lines)
        .map(|i| match i % 50 {
            0 => format!("2024-05-01T09:30:{:02} ERROR worker {i} crashed\n", i % 60),
            7 => format!("2024-05-01T09:30:{:02} WARN retry {i} failed\n", i % 60),
            _ => format!("2024-05-01T09:30:{:02} INFO request {i} served in 3ms\n", i % 60),
        })
        .collect()
}

fn make_processes(n: usize) -> Vec<ProcessInfo> {
    (0..n)
        .map(|i| ProcessInfo {
            pid: i as u32 + 1,
            name: format!("proc_{i}"),
            user: Some(format!("u{}", i % 8)),
            cpu_percent: Some((i % 100) as f32),
            memory_percent: if i % 13 == 0 {
                None
            } else {
                Some(((n - i) % 37) as f32 / 3.0)
            },
        })
        .collect()
}

fn bench_log_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_scan_10k_100k");
    let config = LogConfig::default();

    for size in [10_000usize, 100_000] {
        let log = make_log(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &log, |b, log| {
            let analyzer =
                LogAnalyzer::new(&config.markers, Some("error"), false, config.max_matches)
                    .expect("valid analyzer");
            b.iter(|| {
                let report = analyzer
                    .scan(Cursor::new(black_box(log.as_bytes())))
                    .expect("in-memory scan");
                black_box(report);
            })
        });
    }

    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_500_1000_2000");

    for size in [500usize, 1000, 2000] {
        let processes = make_processes(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &processes,
            |b, processes| {
                b.iter(|| {
                    let ranked = rank(black_box(processes.clone()), Resource::Memory, 10, None)
                        .expect("non-zero count");
                    black_box(ranked);
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_log_scan, bench_rank);
criterion_main!(benches);
