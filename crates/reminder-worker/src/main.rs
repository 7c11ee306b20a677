//! PactForge Reminder Worker
//!
//! Wakes up on a fixed interval and:
//! 1. Sends the daily/weekly pending-approval summary when due
//! 2. Escalates items pending longer than the configured threshold
//!
//! `reminder-worker once` runs a single pass and prints the report.

mod runner;

use crate::runner::TickRunner;
use metrics_exporter_prometheus::PrometheusBuilder;
use pactforge_common::{config::AppConfig, metrics, VERSION};
use pactforge_workflow::Workflow;
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }

    info!("Starting PactForge Reminder Worker v{}", VERSION);

    let run_once = std::env::args().nth(1).as_deref() == Some("once");

    if !run_once && config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!("Metrics exporter listening on {}", addr);
    }
    metrics::register_metrics();

    let workflow = Workflow::connect(&config).await?;
    let mut runner = TickRunner::new(workflow.reminders, config.reminders.tick_interval());

    if run_once {
        // One-shot mode for cron jobs and manual runs
        match runner.run_once().await {
            Ok(report) => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Err(e) => {
                error!(error = %e, "Reminder run failed");
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    info!(
        interval_secs = config.reminders.tick_interval_secs,
        "Reminder worker ready, starting tick loop..."
    );
    runner.run().await;

    info!("Reminder worker shutting down");
    Ok(())
}
