use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::io::Write;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pktview::cli::Args;
use pktview::config::Config;
use pktview::content::curl_command;
use pktview::export::{export_json, export_log_file, write_log};
use pktview::ingest::{Event, FeedStats, Ingestor, SharedIngestor, run_feed};
use pktview::prefs::Prefs;
use pktview::state::{DeviceKey, Packet};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let prefs = Prefs::load();
    let config = Config::resolve(&args, &prefs);

    if args.save_prefs {
        let mut prefs = prefs;
        prefs.export_dir = config.export_dir.clone();
        prefs.max_body_bytes = Some(config.max_body_bytes);
        prefs.save().context("Failed to save preferences")?;
    }

    let ingestor = Ingestor::shared();

    // Cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_clone.cancel();
    });

    if args.is_batch_mode() {
        run_batch_mode(&args, &config, ingestor.clone(), cancel).await?;
    } else {
        run_streaming_mode(&args, &config, ingestor.clone(), cancel).await?;
    }

    if let Some(ref dir) = config.export_dir {
        export_logs(&config, &ingestor, dir)?;
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pktview=debug" } else { "pktview=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Feed every input into the ingestor, one after another
async fn run_feeds(
    inputs: Vec<String>,
    ingestor: SharedIngestor,
    cancel: CancellationToken,
) -> Result<FeedStats> {
    let mut total = FeedStats::default();

    for input in inputs {
        if cancel.is_cancelled() {
            break;
        }
        let stats = if input == "-" {
            run_feed(BufReader::new(tokio::io::stdin()), &ingestor, cancel.clone()).await?
        } else {
            let file = tokio::fs::File::open(&input)
                .await
                .with_context(|| format!("Failed to open capture file: {}", input))?;
            run_feed(BufReader::new(file), &ingestor, cancel.clone())
                .await
                .with_context(|| format!("Failed to read capture file: {}", input))?
        };
        tracing::info!(
            input = %input,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            "capture loaded"
        );
        total.created += stats.created;
        total.updated += stats.updated;
        total.skipped += stats.skipped;
    }

    Ok(total)
}

/// Load all captures, then print every device's filtered packets once
async fn run_batch_mode(
    args: &Args,
    config: &Config,
    ingestor: SharedIngestor,
    cancel: CancellationToken,
) -> Result<()> {
    run_feeds(args.inputs.clone(), ingestor.clone(), cancel).await?;

    let devices: Vec<(DeviceKey, Vec<Packet>)> = ingestor
        .device_keys()
        .into_iter()
        .map(|key| {
            let packets = ingestor.filtered_packets(&key, &config.filter);
            (key, packets)
        })
        .collect();

    let (report, curl, json) = (args.report, args.curl, args.json);
    let classifier = config.classifier();

    // Body classification can be slow for large payloads; keep it off the runtime
    tokio::task::spawn_blocking(move || -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let multiple = devices.len() > 1;

        for (key, packets) in &devices {
            if multiple && !json {
                writeln!(out, "\n=== {} ({} packets) ===\n", key, packets.len())?;
            }
            if json {
                export_json(packets, &mut out)?;
            } else if report {
                write_log(packets, &classifier, &mut out)?;
            } else if curl {
                for (i, packet) in packets.iter().enumerate() {
                    if i > 0 {
                        writeln!(out)?;
                    }
                    writeln!(out, "{}", curl_command(&packet.request_info))?;
                }
            }
        }
        Ok(())
    })
    .await??;

    Ok(())
}

/// Print a row for each packet as it arrives or changes status
async fn run_streaming_mode(
    args: &Args,
    config: &Config,
    ingestor: SharedIngestor,
    cancel: CancellationToken,
) -> Result<()> {
    let mut subscription = ingestor.subscribe();
    let mut feed = tokio::spawn(run_feeds(
        args.inputs.clone(),
        ingestor.clone(),
        cancel.clone(),
    ));

    // Last printed status per packet, to print updates only when they matter
    let mut printed: HashMap<(DeviceKey, String), Option<String>> = HashMap::new();

    let mut feed_done = false;
    while !feed_done {
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = &mut feed => {
                let stats = result??;
                tracing::debug!(total = stats.total(), "all captures loaded");
                feed_done = true;
            }
            Some(event) = subscription.recv() => {
                print_changes(&event, &ingestor, config, &mut printed);
            }
        }
    }

    // Events published before the feed finished are still queued
    for event in subscription.drain() {
        print_changes(&event, &ingestor, config, &mut printed);
    }
    ingestor.unsubscribe(subscription.id());

    Ok(())
}

fn print_changes(
    event: &Event,
    ingestor: &Ingestor,
    config: &Config,
    printed: &mut HashMap<(DeviceKey, String), Option<String>>,
) {
    let Event::PacketsChanged { device } = event else {
        return;
    };

    for packet in ingestor.filtered_packets(device, &config.filter) {
        let info = &packet.request_info;
        let slot = (device.clone(), packet.packet_id.clone());
        if printed.get(&slot) == Some(&info.status_code) {
            continue;
        }
        println!(
            "{:<19}  {:<20}  {:<7} {:>5}  {}",
            info.started_readable().unwrap_or_default(),
            device.to_string(),
            info.request_method,
            info.status_code.as_deref().unwrap_or("-"),
            info.url
        );
        printed.insert(slot, info.status_code.clone());
    }
}

/// Write one log file per device with its filtered packets
fn export_logs(config: &Config, ingestor: &Ingestor, dir: &std::path::Path) -> Result<()> {
    let classifier = config.classifier();
    for key in ingestor.device_keys() {
        let Some(device) = ingestor.device(&key) else {
            continue;
        };
        let packets = config.filter.apply(device.packets());
        if packets.is_empty() {
            continue;
        }
        let path = export_log_file(dir, &key.project, device.label(), packets, &classifier)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}
