// Public API - data types, ingestion, rendering and export
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod prefs;
pub mod state;

pub use error::{Error, Result};
