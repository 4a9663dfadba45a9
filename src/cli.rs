use clap::Parser;
use std::path::PathBuf;

/// Inspect captured HTTP traffic: group by project and device, filter, and
/// render overviews or cURL commands
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pktview")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture files with one packet record per line ("-" reads stdin)
    #[arg(default_value = "-")]
    pub inputs: Vec<String>,

    /// Only packets whose URL contains this text (case-sensitive)
    #[arg(short = 'a', long = "address", default_value = "")]
    pub address: String,

    /// Only packets whose method contains this text (case-insensitive)
    #[arg(short = 'm', long = "method", default_value = "")]
    pub method: String,

    /// Only packets whose status contains this text (" " = no status yet)
    #[arg(short = 's', long = "status", default_value = "")]
    pub status: String,

    /// Print the overview of every packet (batch)
    #[arg(long = "report")]
    pub report: bool,

    /// Print a cURL command for every packet (batch)
    #[arg(long = "curl")]
    pub curl: bool,

    /// Print packets as JSON lines (batch)
    #[arg(long = "json")]
    pub json: bool,

    /// Write one log file per device into this directory
    #[arg(long = "export-dir")]
    pub export_dir: Option<PathBuf>,

    /// Bodies larger than this many bytes are not classified
    #[arg(long = "max-body-size")]
    pub max_body_size: Option<usize>,

    /// Remember --export-dir and --max-body-size as defaults
    #[arg(long = "save-prefs")]
    pub save_prefs: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Check if running in batch mode (non-streaming)
    pub fn is_batch_mode(&self) -> bool {
        self.report || self.curl || self.json
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        let modes = [self.report, self.curl, self.json]
            .iter()
            .filter(|m| **m)
            .count();
        if modes > 1 {
            return Err("Only one of --report, --curl, --json can be used".into());
        }

        if self.max_body_size == Some(0) {
            return Err("Max body size must be positive".into());
        }

        if self.inputs.iter().filter(|i| *i == "-").count() > 1 {
            return Err("Standard input can only be read once".into());
        }

        if let Some(ref dir) = self.export_dir {
            if dir.as_os_str().is_empty() {
                return Err("Export directory cannot be empty".into());
            }
        }

        Ok(())
    }
}
