mod cli;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use plexatv_core::config::AppConfig;
use plexatv_core::event_log::EventEntry;
use plexatv_runtime::{Runtime, RuntimeError, SessionSensor, TickOutcome};

use crate::cli::{Cli, Command};

const DEFAULT_LOG_FILTER: &str = "plexatv=info";

/// Install the global subscriber. Returns the file writer guard, which must
/// live until the process exits.
fn init_logging(cli: &Cli, config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(cli.log_level.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });

    match &config.general.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "plexatv.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn print_sensor(sensor: &SessionSensor, json: bool) {
    if json {
        match serde_json::to_string(sensor) {
            Ok(line) => println!("{line}"),
            Err(e) => error!(error = %e, "Failed to serialize state"),
        }
    } else {
        println!("{sensor}");
    }
}

/// Keep trying to reach the server; a failed attempt is retried next tick.
async fn connect_with_retry(config: &AppConfig, every: Duration) -> Runtime<plexatv_api::PlexClient> {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match Runtime::connect(config).await {
            Ok(rt) => return rt,
            Err(e) => warn!(error = %e, "Could not connect, retrying"),
        }
    }
}

async fn watch(config: AppConfig, tick: u64, json: bool) -> ExitCode {
    let every = Duration::from_secs(tick.max(1));
    let name = config.server.name.clone();

    let poll_loop = async {
        let rt = connect_with_retry(&config, every).await;
        rt.run(every, |result: &Result<TickOutcome, RuntimeError>| match result {
            Ok(TickOutcome::Published(summary)) => {
                print_sensor(&SessionSensor::new(name.clone(), summary.clone()), json);
            }
            Ok(TickOutcome::Skipped(_)) => {}
            Err(e) => warn!(error = %e, "Poll failed, keeping previous state"),
        })
        .await;
    };

    tokio::select! {
        _ = poll_loop => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    ExitCode::SUCCESS
}

/// One line per poll event, oldest first.
fn format_events(events: &[EventEntry]) -> String {
    events
        .iter()
        .map(|(at, event)| format!("{} {event:?}", at.format("%Y-%m-%dT%H:%M:%S%.3fZ")))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn once(config: AppConfig, events: bool) -> ExitCode {
    let rt = match Runtime::connect(&config).await {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Could not connect");
            return ExitCode::FAILURE;
        }
    };

    let result = rt.force_poll().await;
    if events {
        eprintln!("{}", format_events(&rt.events()));
    }
    if let Err(e) = result {
        error!(error = %e, "Poll failed");
        return ExitCode::FAILURE;
    }

    match serde_json::to_string_pretty(&rt.sensor().await) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize state");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_logging(&cli, &config);

    info!(
        name = %config.server.name,
        server = %config.server.base_url(),
        interval = config.general.poll_interval,
        "Starting"
    );

    match cli.command {
        Command::Watch { tick, json } => watch(config, tick, json).await,
        Command::Once { events } => once(config, events).await,
    }
}
