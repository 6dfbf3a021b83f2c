use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::WorkflowConfig;
use crate::error::{MonitorError, Result};

pub const OTHER_LANGUAGE: &str = "other";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileLines {
    pub path: String,
    pub lines: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GitStatus {
    pub branch: String,
    pub has_changes: bool,
    pub last_commit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectReport {
    pub root: PathBuf,
    pub file_count: u64,
    pub total_lines: u64,
    /// Extension -> file count, unrecognized extensions under `other`.
    pub languages: BTreeMap<String, u64>,
    pub lines_by_language: BTreeMap<String, u64>,
    pub last_modified: Option<DateTime<Local>>,
    pub largest_files: Vec<FileLines>,
    pub git: Option<GitStatus>,
}

pub struct WorkflowMonitor {
    ignore_dirs: HashSet<String>,
    extensions: HashSet<String>,
    largest_files: usize,
    inspect_git: bool,
}

impl WorkflowMonitor {
    pub fn new(config: &WorkflowConfig) -> Self {
        WorkflowMonitor {
            ignore_dirs: config.ignore_dirs.iter().cloned().collect(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            largest_files: config.largest_files,
            inspect_git: true,
        }
    }

    pub fn without_git(mut self) -> Self {
        self.inspect_git = false;
        self
    }

    fn language_of(&self, path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| self.extensions.contains(e))
            .unwrap_or_else(|| OTHER_LANGUAGE.to_string())
    }

    pub fn scan(&self, root: &Path) -> Result<ProjectReport> {
        let _span = tracing::debug_span!("workflow.scan", root = %root.display()).entered();

        let meta = fs::metadata(root).map_err(|e| MonitorError::from_io(root, e))?;
        if !meta.is_dir() {
            return Err(MonitorError::NotFound(root.to_path_buf()));
        }
        // Fail loudly on the root; deeper unreadable directories are skipped.
        fs::read_dir(root).map_err(|e| MonitorError::from_io(root, e))?;

        let mut report = ProjectReport {
            root: root.to_path_buf(),
            file_count: 0,
            total_lines: 0,
            languages: BTreeMap::new(),
            lines_by_language: BTreeMap::new(),
            last_modified: None,
            largest_files: Vec::new(),
            git: None,
        };
        let mut per_file = Vec::new();

        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                let path = entry.path();
                if file_type.is_dir() {
                    let name = entry.file_name();
                    if !self.ignore_dirs.contains(name.to_string_lossy().as_ref()) {
                        stack.push(path);
                    }
                } else if file_type.is_file() {
                    let lines = match count_lines(&path) {
                        Ok(lines) => lines,
                        Err(e) => {
                            tracing::warn!(file = %path.display(), error = %e, "could not count lines");
                            0
                        }
                    };
                    let language = self.language_of(&path);

                    report.file_count += 1;
                    report.total_lines += lines;
                    *report.languages.entry(language.clone()).or_default() += 1;
                    *report.lines_by_language.entry(language).or_default() += lines;

                    if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                        let modified = DateTime::<Local>::from(modified);
                        if report.last_modified.is_none_or(|latest| modified > latest) {
                            report.last_modified = Some(modified);
                        }
                    }

                    per_file.push(FileLines {
                        path: relative_display(root, &path),
                        lines,
                    });
                }
            }
        }

        per_file.sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.path.cmp(&b.path)));
        per_file.truncate(self.largest_files);
        report.largest_files = per_file;

        if self.inspect_git && root.join(".git").exists() {
            report.git = git_status(root);
        }

        tracing::debug!(
            files = report.file_count,
            lines = report.total_lines,
            "project scan complete"
        );
        Ok(report)
    }
}

/// Newline-delimited segments; a trailing segment without a newline still counts.
pub fn count_lines(path: &Path) -> std::io::Result<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    let mut lines = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(lines);
        }
        lines += 1;
    }
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn git(root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Branch, dirty flag and last commit, or `None` when `git` is unavailable.
pub fn git_status(root: &Path) -> Option<GitStatus> {
    let Some(porcelain) = git(root, &["status", "--porcelain"]) else {
        tracing::warn!(root = %root.display(), "git status failed");
        return None;
    };
    let branch = git(root, &["branch", "--show-current"])
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let last_commit = git(root, &["log", "-1", "--pretty=format:%h - %an, %ar : %s"])
        .filter(|c| !c.is_empty());

    Some(GitStatus {
        branch,
        has_changes: !porcelain.is_empty(),
        last_commit,
    })
}
