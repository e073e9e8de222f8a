//! Bot Dashboard - headless entry point
//!
//! Reads bot messages as JSON lines on stdin, writes outbound requests as
//! JSON lines on stdout and logs chart activity to stderr. The config path is
//! the first argument, `BOT_DASHBOARD_CONFIG`, or the platform default.

use anyhow::Context;
use bot_dashboard::{
    chart::{Chart, Series},
    config::{self, DashboardConfig},
    gimbal,
    connection::{BotConnection, ChannelSink, Clock, RequestSink, SystemClock},
    polling::PollerBank,
};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Inbound lines buffered between the stdin thread and the frame loop
const INBOUND_QUEUE: usize = 4096;

/// Interval between chart summaries in the log
const REPORT_PERIOD: Duration = Duration::from_secs(5);

struct ChartView {
    name: String,
    chart: Chart,
    series: Vec<Series>,
}

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(config::CONFIG_ENV).map(PathBuf::from))
        .or_else(config::default_config_path)
}

fn main() -> anyhow::Result<()> {
    let path = config_path();
    let loaded = path
        .as_ref()
        .filter(|p| p.exists())
        .map(|p| (p.clone(), DashboardConfig::load(p)));
    let filter = match &loaded {
        Some((_, Ok(config))) => config.logging.filter.clone(),
        _ => DashboardConfig::default().logging.filter,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting bot dashboard");

    let config = match loaded {
        Some((path, Ok(config))) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Some((path, Err(e))) => {
            tracing::warn!("Failed to load {:?}, using defaults: {}", path, e);
            DashboardConfig::default()
        }
        None => {
            tracing::info!("No config file found, using defaults");
            DashboardConfig::default()
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: DashboardConfig) -> anyhow::Result<()> {
    let (sink, outbound_rx) = ChannelSink::new(config.connection.outbound_queue);
    let socket: Arc<dyn RequestSink> = Arc::new(sink);
    let connection = BotConnection::new(Arc::clone(&socket));

    let writer = std::thread::spawn(move || write_outbound(outbound_rx));
    let inbound_rx = spawn_stdin_reader();

    let views: Vec<ChartView> = config
        .charts
        .iter()
        .map(|spec| {
            let chart = Chart::new(config.chart.clone());
            let series = spec
                .series
                .iter()
                .map(|s| Series::attach(&chart, connection.events(), s.extractors(), s.options()))
                .collect();
            ChartView {
                name: spec.name.clone(),
                chart,
                series,
            }
        })
        .collect();
    tracing::info!("Attached {} charts", views.len());

    let mut pollers = PollerBank::from_specs(
        &config.pollers,
        Arc::clone(&socket),
        tokio::runtime::Handle::current(),
    );

    if let Err(e) = connection.send(&gimbal::request_all()) {
        tracing::warn!("Initial parameter read not sent: {}", e);
    }

    let mut frames =
        tokio::time::interval(Duration::from_millis(config.connection.frame_period_ms.max(1)));
    let mut report = tokio::time::interval(REPORT_PERIOD);
    let clock = SystemClock;
    let mut received = 0u64;

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let (count, open) = drain_inbound(&inbound_rx, &connection);
                received += count;
                connection.frame();
                let now = clock.now_millis();
                for view in &views {
                    view.chart.tick(now);
                }
                if !open {
                    tracing::info!("Input closed after {} messages", received);
                    break;
                }
            }
            _ = report.tick() => {
                for view in &views {
                    tracing::info!(
                        chart = %view.name,
                        series = view.series.len(),
                        points = view.chart.total_points(),
                        range = ?view.chart.value_range(),
                        "chart status"
                    );
                }
            }
        }
    }

    pollers.teardown_all();
    drop(pollers);
    drop(views);
    drop(connection);
    drop(socket);

    match writer.join() {
        Ok(result) => result.context("Failed to write outbound requests")?,
        Err(_) => anyhow::bail!("Outbound writer thread panicked"),
    }
    tracing::info!("Shutting down...");
    Ok(())
}

/// Feed every queued line to the connection. Returns how many were taken and
/// whether stdin is still open.
fn drain_inbound(rx: &Receiver<String>, connection: &BotConnection) -> (u64, bool) {
    let mut count = 0;
    loop {
        match rx.try_recv() {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                count += 1;
                if let Err(e) = connection.receive_json(&line) {
                    tracing::debug!("Dropping malformed message: {}", e);
                }
            }
            Err(TryRecvError::Empty) => return (count, true),
            Err(TryRecvError::Disconnected) => return (count, false),
        }
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = bounded(INBOUND_QUEUE);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn write_outbound(rx: Receiver<String>) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in rx {
        writeln!(out, "{}", line)?;
        out.flush()?;
    }
    Ok(())
}
