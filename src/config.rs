use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::system::export::ExportFormat;
use crate::system::process::Resource;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub processes: ProcessesConfig,
    pub log: LogConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub duration_secs: f64,
    pub interval_secs: f64,
    pub mount_point: PathBuf,
    pub default_format: ExportFormat,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            duration_secs: 60.0,
            interval_secs: 5.0,
            mount_point: PathBuf::from("/"),
            default_format: ExportFormat::Json,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProcessesConfig {
    pub count: usize,
    pub resource: Resource,
}

impl Default for ProcessesConfig {
    fn default() -> Self {
        ProcessesConfig {
            count: 10,
            resource: Resource::Cpu,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub markers: Vec<String>,
    pub max_matches: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            markers: [
                "error",
                "exception",
                "fail",
                "traceback",
                "critical",
                "fatal",
            ]
            .map(String::from)
            .to_vec(),
            max_matches: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub ignore_dirs: Vec<String>,
    pub extensions: Vec<String>,
    pub largest_files: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        WorkflowConfig {
            ignore_dirs: [
                ".git",
                ".hg",
                ".svn",
                ".idea",
                ".vscode",
                "node_modules",
                "target",
                "__pycache__",
                ".venv",
                "venv",
                "dist",
                "build",
            ]
            .map(String::from)
            .to_vec(),
            extensions: [
                "rs", "py", "js", "ts", "jsx", "tsx", "go", "java", "kt", "c", "h", "cpp", "hpp",
                "cs", "rb", "php", "swift", "scala", "sh", "sql", "html", "css", "md", "txt",
                "toml", "yaml", "yml", "json", "xml",
            ]
            .map(String::from)
            .to_vec(),
            largest_files: 10,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sysmon").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            Config::default()
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
            Config::default()
        }
    }
}
