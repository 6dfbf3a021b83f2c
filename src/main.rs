use std::io::{IsTerminal, stdout};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tokio::sync::watch;

use sysmon::analysis::logfile::LogAnalyzer;
use sysmon::analysis::project::WorkflowMonitor;
use sysmon::config::{self, Config, load_config, load_config_from_path};
use sysmon::logging::{LogFormat, init_tracing};
use sysmon::report::{self, Style};
use sysmon::system::collector::Collector;
use sysmon::system::export::{self, ExportFormat};
use sysmon::system::process::{Resource, name_filter};
use sysmon::system::ranker::Ranker;
use sysmon::system::sampler::{SamplePlan, Sampler};

#[derive(Parser)]
#[command(
    name = "sysmon",
    version,
    about = "Monitor system resources, processes, logs and project workflows"
)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase diagnostic verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Diagnostic log format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample CPU, memory, disk and network usage over time
    System {
        /// Total sampling time in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Seconds between captures
        #[arg(long)]
        interval: Option<f64>,

        /// Write the session to this file (.json or .csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Export format, overriding the file extension
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,

        /// Mount point whose disk usage is recorded
        #[arg(long)]
        mount_point: Option<PathBuf>,
    },

    /// Show the top processes by CPU or memory usage
    Processes {
        /// Number of processes to show
        #[arg(long)]
        count: Option<usize>,

        /// Resource to rank by
        #[arg(long, value_enum)]
        resource: Option<Resource>,

        /// Only include processes whose name matches this regex (case-insensitive)
        #[arg(long)]
        name: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Scan a log file for errors or a pattern
    Log {
        /// Log file to analyze
        #[arg(long)]
        log_path: PathBuf,

        /// Pattern to count (case-insensitive substring)
        #[arg(long)]
        pattern: Option<String>,

        /// Treat the pattern as a regular expression
        #[arg(long, requires = "pattern")]
        regex: bool,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Summarize files, lines and git state of a project directory
    Workflow {
        /// Project directory to scan
        #[arg(long, default_value = ".")]
        project_path: PathBuf,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format)?;
    let config = load_config_for_cli(&cli);
    let style = Style {
        color: stdout().is_terminal(),
    };

    match cli.command {
        Command::System {
            duration,
            interval,
            output,
            format,
            mount_point,
        } => {
            let system = &config.system;
            let plan = SamplePlan::new(
                duration.unwrap_or(system.duration_secs),
                interval.unwrap_or(system.interval_secs),
            )?;
            let mount_point = mount_point.unwrap_or_else(|| system.mount_point.clone());
            let format = output
                .as_deref()
                .map(|path| ExportFormat::resolve(format, path, system.default_format));
            run_system(plan, Collector::new(&mount_point), output, format, style).await
        }
        Command::Processes {
            count,
            resource,
            name,
            json,
        } => {
            let count = count.unwrap_or(config.processes.count);
            let resource = resource.unwrap_or(config.processes.resource);
            let filter = name.as_deref().map(name_filter).transpose()?;

            let mut ranker = Ranker::new(Collector::default());
            let top = ranker.top(count, resource, filter.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&top)?);
            } else {
                println!("{}", report::process_table(&top, resource, style));
            }
            Ok(())
        }
        Command::Log {
            log_path,
            pattern,
            regex,
            json,
        } => {
            let analyzer = LogAnalyzer::new(
                &config.log.markers,
                pattern.as_deref(),
                regex,
                config.log.max_matches,
            )?;
            let result = analyzer.analyze(&log_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", report::log_report(&result, style));
            }
            Ok(())
        }
        Command::Workflow { project_path, json } => {
            let monitor = WorkflowMonitor::new(&config.workflow);
            let result = monitor.scan(&project_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", report::project_report(&result, style));
            }
            Ok(())
        }
    }
}

async fn run_system(
    plan: SamplePlan,
    collector: Collector,
    output: Option<PathBuf>,
    format: Option<ExportFormat>,
    style: Style,
) -> Result<()> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C, finishing...");
            let _ = shutdown_tx.send(true);
        }
    });
    // Let the handler register before the first blocking capture.
    tokio::task::yield_now().await;

    println!(
        "Starting system monitoring for {} seconds (interval: {}s), press Ctrl+C to stop",
        plan.duration().as_secs_f64(),
        plan.interval().as_secs_f64()
    );

    let started = Instant::now();
    let mut sampler = Sampler::new(collector);
    let session = sampler
        .run(&plan, &mut shutdown_rx, |snapshot| {
            println!("{}", report::snapshot_line(snapshot, style));
        })
        .await;

    if let (Some(path), Some(format)) = (output.as_deref(), format) {
        export::write(&session.snapshots, path, format)?;
    }
    println!(
        "{}",
        report::session_summary(&session, started.elapsed(), output.as_deref())
    );
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => load_config_from_path(path),
        None => {
            tracing::debug!(path = ?config::config_path(), "loading default config");
            load_config()
        }
    }
}
