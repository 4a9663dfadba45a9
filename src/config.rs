use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::Args;
use crate::content::{Classifier, DEFAULT_MAX_BODY_BYTES};
use crate::filter::PacketFilter;
use crate::prefs::Prefs;

/// Runtime configuration derived from CLI args and saved preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Bodies larger than this are not classified
    pub max_body_bytes: usize,
    /// Filter applied to every device's packet list
    pub filter: PacketFilter,
    /// Where device logs are written (None = no export)
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            filter: PacketFilter::default(),
            export_dir: None,
        }
    }
}

impl Config {
    /// CLI values win over saved preferences, which win over defaults
    pub fn resolve(args: &Args, prefs: &Prefs) -> Self {
        let defaults = Self::default();
        Self {
            max_body_bytes: args
                .max_body_size
                .or(prefs.max_body_bytes)
                .unwrap_or(defaults.max_body_bytes),
            filter: PacketFilter::new(&args.address, &args.method, &args.status),
            export_dir: args.export_dir.clone().or_else(|| prefs.export_dir.clone()),
        }
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.max_body_bytes)
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self::resolve(args, &Prefs::default())
    }
}
