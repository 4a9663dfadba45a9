use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::content::{Classifier, overview};
use crate::error::Error;
use crate::state::Packet;

/// `{project}-{device}-{yyyyMMdd-HHmmss}.log`, with path separators replaced
pub fn log_file_name(project: &str, device: &str, at: DateTime<Local>) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_");
    format!(
        "{}-{}-{}.log",
        clean(project),
        clean(device),
        at.format("%Y%m%d-%H%M%S")
    )
}

/// Write the overview of each packet, separated by a blank line
pub fn write_log<'a, W, I>(packets: I, classifier: &Classifier, mut writer: W) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Packet>,
{
    for (i, packet) in packets.into_iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{}", overview(&packet.request_info, classifier))?;
    }
    writer.flush()
}

/// Write a log file for one device's packets into `dir`. Returns the path.
pub fn export_log_file<'a, I>(
    dir: &Path,
    project: &str,
    device: &str,
    packets: I,
    classifier: &Classifier,
) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a Packet>,
{
    if !dir.is_dir() {
        return Err(Error::Export(format!("not a directory: {}", dir.display())).into());
    }

    let path = dir.join(log_file_name(project, device, Local::now()));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    write_log(packets, classifier, BufWriter::new(file))
        .with_context(|| format!("Failed to write log file: {}", path.display()))?;

    tracing::info!(path = %path.display(), "exported log");
    Ok(path)
}
