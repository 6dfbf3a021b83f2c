use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::snapshot::Snapshot;
use crate::error::{MonitorError, Result};

pub const CSV_HEADER: &str = "timestamp,cpu_percent,memory_total,memory_used,memory_percent,disk_total,disk_used,disk_percent,net_bytes_sent,net_bytes_recv";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    /// Explicit choice wins, then the file extension, then `fallback`.
    pub fn resolve(explicit: Option<Self>, path: &Path, fallback: Self) -> Self {
        explicit
            .or_else(|| Self::from_extension(path))
            .unwrap_or(fallback)
    }
}

pub fn write(snapshots: &[Snapshot], path: &Path, format: ExportFormat) -> Result<()> {
    let file = File::create(path).map_err(|e| MonitorError::from_io(path, e))?;
    let mut out = BufWriter::new(file);

    let written = match format {
        ExportFormat::Json => write_json(snapshots, &mut out),
        ExportFormat::Csv => write_csv(snapshots, &mut out),
    };
    written
        .and_then(|()| out.flush())
        .map_err(|e| MonitorError::from_io(path, e))?;

    tracing::info!(path = %path.display(), ?format, count = snapshots.len(), "exported session");
    Ok(())
}

pub fn write_json<W: Write>(snapshots: &[Snapshot], out: &mut W) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, snapshots)?;
    writeln!(out)
}

pub fn write_csv<W: Write>(snapshots: &[Snapshot], out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for s in snapshots {
        write!(
            out,
            "{},{},{},{},{},",
            s.timestamp.to_rfc3339(),
            s.cpu_percent,
            s.memory.total,
            s.memory.used,
            s.memory.percent
        )?;
        match &s.disk {
            Some(disk) => write!(out, "{},{},{},", disk.total, disk.used, disk.percent)?,
            None => write!(out, ",,,")?,
        }
        writeln!(out, "{},{}", s.network.bytes_sent, s.network.bytes_recv)?;
    }
    Ok(())
}
