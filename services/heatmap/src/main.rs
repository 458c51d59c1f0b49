//! AQI heatmap refresh service.
//!
//! Polls the backend hotspot grid, runs the contouring pipeline, and
//! maintains the rendered contour layer. Runs once or continuously.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use aqi_common::severity::{aqi_thresholds, legend};
use heatmap::client::{GridSource, HttpGridSource};
use heatmap::config::HeatmapConfig;
use heatmap::layer::GeoJsonStdoutSink;
use heatmap::refresh::RefreshEngine;
use heatmap::testdata::OfflineGridSource;

#[derive(Parser, Debug)]
#[command(name = "heatmap")]
#[command(about = "AQI contour heatmap refresh service")]
struct Args {
    /// Backend integration layer base URL
    #[arg(long, env = "BACKEND_URL", default_value = "http://localhost:8000")]
    backend_url: String,

    /// Run one refresh cycle and exit (vs continuous polling)
    #[arg(long)]
    once: bool,

    /// Use the built-in synthetic Delhi grid instead of the backend
    #[arg(long)]
    offline: bool,

    /// Print each attached layer as GeoJSON on stdout
    #[arg(long)]
    emit_geojson: bool,

    /// Print the AQI legend bands and exit
    #[arg(long)]
    show_legend: bool,

    /// Seconds between refresh cycles
    #[arg(long, default_value = "60")]
    interval_secs: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level: Level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.show_legend {
        for band in legend() {
            match band.gradient_to {
                Some(to) => println!(
                    "{:<22} {:<10} {} \u{2192} {}",
                    band.label,
                    band.range,
                    band.color.hex(),
                    to.hex()
                ),
                None => println!("{:<22} {:<10} {}", band.label, band.range, band.color.hex()),
            }
        }
        return Ok(());
    }

    let config = HeatmapConfig {
        backend_url: args.backend_url,
        poll_interval: Duration::from_secs(args.interval_secs),
        thresholds: aqi_thresholds(),
    };

    let source: Arc<dyn GridSource> = if args.offline {
        info!("using synthetic offline grid");
        Arc::new(OfflineGridSource)
    } else {
        info!(backend_url = %config.backend_url, "using backend hotspot endpoint");
        Arc::new(HttpGridSource::new(&config.backend_url)?)
    };

    let sink = Box::new(GeoJsonStdoutSink::new(args.emit_geojson));
    let engine = RefreshEngine::new(source, sink, config.thresholds.clone());

    if args.once {
        engine.refresh().await?;
        return Ok(());
    }

    info!(interval_secs = args.interval_secs, "starting refresh loop");
    let mut ticker = tokio::time::interval(config.poll_interval);
    loop {
        ticker.tick().await;
        // A failed cycle leaves the previous layer attached
        if let Err(e) = engine.refresh().await {
            if e.is_recoverable() {
                warn!(error = %e, "refresh failed, keeping previous layer");
            } else {
                return Err(e.into());
            }
        }
    }
}
