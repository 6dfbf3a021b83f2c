//! Human-readable renderings of command results.
//!
//! Every renderer returns a `String` so the binary decides where it goes and tests can
//! compare output directly. Colour is applied only when a [`Style`] asks for it.

use std::fmt::Write;
use std::path::Path;
use std::time::Duration;

use crossterm::style::Stylize;

use crate::analysis::logfile::LogReport;
use crate::analysis::project::ProjectReport;
use crate::format::{format_bytes, format_percent, pad_unicode};
use crate::system::process::{ProcessInfo, Resource};
use crate::system::sampler::Session;
use crate::system::snapshot::Snapshot;

const NAME_WIDTH: usize = 25;
const USER_WIDTH: usize = 15;

#[derive(Clone, Copy, Debug, Default)]
pub struct Style {
    pub color: bool,
}

impl Style {
    pub fn plain() -> Self {
        Style { color: false }
    }

    fn heading(self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    // Thresholds follow the usual green/yellow/red load bands.
    fn load(self, percent: f32, text: String) -> String {
        if !self.color {
            return text;
        }
        match percent {
            p if p < 50.0 => text.green().to_string(),
            p if p < 80.0 => text.yellow().to_string(),
            _ => text.red().to_string(),
        }
    }
}

pub fn snapshot_line(snapshot: &Snapshot, style: Style) -> String {
    let disk = match &snapshot.disk {
        Some(d) => style.load(d.percent, format!("{:.1}%", d.percent)),
        None => "n/a".to_string(),
    };
    format!(
        "Recorded system snapshot at {} | CPU {} | MEM {} of {} | DISK {} | NET {} sent, {} recv",
        snapshot.timestamp.to_rfc3339(),
        style.load(snapshot.cpu_percent, format!("{:.1}%", snapshot.cpu_percent)),
        style.load(snapshot.memory.percent, format!("{:.1}%", snapshot.memory.percent)),
        format_bytes(snapshot.memory.total),
        disk,
        format_bytes(snapshot.network.bytes_sent),
        format_bytes(snapshot.network.bytes_recv),
    )
}

pub fn session_summary(session: &Session, elapsed: Duration, output: Option<&Path>) -> String {
    let mut out = String::new();
    if session.cancelled {
        let _ = writeln!(out, "Sampling interrupted, keeping collected snapshots");
    }
    let _ = writeln!(
        out,
        "Monitoring complete after {:.1} seconds",
        elapsed.as_secs_f64()
    );
    let _ = write!(out, "Collected {} snapshots", session.snapshots.len());
    if session.skipped > 0 {
        let _ = write!(out, " ({} skipped)", session.skipped);
    }
    if let Some(path) = output {
        let _ = write!(out, "\nMonitoring data saved to {}", path.display());
    }
    out
}

pub fn process_table(processes: &[ProcessInfo], resource: Resource, style: Style) -> String {
    let other = resource.other();
    let header = format!(
        "{:<8} {} {} {:>8} {:>8}",
        "PID",
        pad_unicode("Name", NAME_WIDTH),
        pad_unicode("User", USER_WIDTH),
        format!("{}%", resource.label()),
        format!("{}%", other.label()),
    );
    let rule = "-".repeat(header.len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        style.heading(&format!(
            "Top {} processes by {} usage:",
            processes.len(),
            resource.label()
        ))
    );
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{}", style.heading(&header));
    let _ = write!(out, "{rule}");

    for p in processes {
        let _ = write!(
            out,
            "\n{:<8} {} {} {:>8} {:>8}",
            p.pid,
            pad_unicode(&p.name, NAME_WIDTH),
            pad_unicode(p.user.as_deref().unwrap_or("N/A"), USER_WIDTH),
            format_percent(resource.read(p)),
            format_percent(other.read(p)),
        );
    }
    out
}

pub fn log_report(report: &LogReport, style: Style) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        style.heading(&format!("Log analysis for: {}", report.path.display()))
    );
    let _ = writeln!(out, "Total lines: {}", report.total_lines);
    let _ = writeln!(out, "Matched lines: {}", report.matched_lines);
    let _ = write!(out, "Error rate: {:.2}%", report.error_rate);

    if !report.pattern_counts.is_empty() {
        let _ = write!(out, "\n\n{}", style.heading("Markers found:"));
        let mut counts: Vec<(&String, &u64)> = report.pattern_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (marker, count) in counts {
            let _ = write!(out, "\n  {marker}: {count} occurrences");
        }
    }

    if !report.first_matches.is_empty() {
        let _ = write!(out, "\n\n{}", style.heading("First matches:"));
        for m in &report.first_matches {
            let _ = write!(out, "\n  Line {}: {}", m.line_number, m.line);
        }
    }
    out
}

pub fn project_report(report: &ProjectReport, style: Style) -> String {
    let mut out = String::new();
    let title = format!("Workflow monitoring for: {}", report.root.display());
    let _ = writeln!(out, "{}", style.heading(&title));
    let _ = writeln!(out, "{}", "=".repeat(title.len().min(60)));

    if let Some(git) = &report.git {
        let _ = writeln!(out, "Git branch: {}", git.branch);
        let _ = writeln!(out, "Has uncommitted changes: {}", git.has_changes);
        let _ = writeln!(
            out,
            "Last commit: {}",
            git.last_commit.as_deref().unwrap_or("none")
        );
        out.push('\n');
    }

    let _ = writeln!(out, "{}", style.heading("Project stats:"));
    let _ = writeln!(out, "  Total files: {}", report.file_count);
    let _ = writeln!(out, "  Total lines: {}", report.total_lines);
    let last_modified = report
        .last_modified
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let _ = write!(out, "  Last modified: {last_modified}");

    if !report.languages.is_empty() {
        let _ = write!(out, "\n\n{}", style.heading("File types:"));
        let mut langs: Vec<(&String, &u64)> = report.languages.iter().collect();
        langs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (lang, count) in langs.into_iter().take(10) {
            let lines = report.lines_by_language.get(lang).copied().unwrap_or(0);
            let _ = write!(out, "\n  {lang}: {count} files, {lines} lines");
        }
    }

    if !report.largest_files.is_empty() {
        let _ = write!(out, "\n\n{}", style.heading("Largest files:"));
        for f in report.largest_files.iter().take(5) {
            let _ = write!(out, "\n  {}: {} lines", f.path, f.lines);
        }
    }
    out
}
