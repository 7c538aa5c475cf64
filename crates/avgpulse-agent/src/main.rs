//! avgpulse agent
//!
//! Reads `<counter> <value>` lines from stdin and feeds them to the counters
//! declared in the config file. Averages are printed to the log and written
//! to stdout as JSON lines.
//!
//! Usage: `avgpulse-agent [config.yaml]` (default `avgpulse.yaml`)
//! Set `AVGPULSE_SINK=log` to send averages to the tracing log instead.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use avgpulse_agent::{config, CounterFactory, LogSink, MetricSink, StdoutSink};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "avgpulse.yaml".to_string());
    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(%path, error = %e, "config load failed");
            std::process::exit(1);
        }
    };

    let sink: Arc<dyn MetricSink> = match std::env::var("AVGPULSE_SINK").as_deref() {
        Ok("log") => Arc::new(LogSink),
        _ => Arc::new(StdoutSink::new()),
    };

    let factory = match CounterFactory::from_config(cfg, sink) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            std::process::exit(1);
        }
    };

    tracing::info!(counters = ?factory.counter_names(), "avgpulse-agent running");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => record_line(&factory, &line),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    factory.shutdown_all().await;
    tracing::info!(metrics = %factory.metrics().render(), "avgpulse-agent stopped");
}

fn record_line(factory: &CounterFactory, line: &str) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }

    let Some((name, raw)) = line.split_once(char::is_whitespace) else {
        tracing::warn!(%line, "expected `<counter> <value>`");
        return;
    };

    let Some(counter) = factory.counter(name) else {
        tracing::warn!(counter = %name, "unknown counter");
        return;
    };

    let value = raw.trim().parse::<f64>().unwrap_or(f64::NAN);
    if counter.count(value).is_none() {
        tracing::warn!(counter = %name, value = %raw.trim(), "observation rejected");
    }
}
