use std::path::PathBuf;

use clap::{Parser, Subcommand};

use plexatv_core::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "plexatv", version, about = "Now-playing summary for a Plex media server")]
pub struct Cli {
    /// Config file to use instead of the per-user one.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Media server host (overrides config).
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Media server port (overrides config).
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Access token (overrides config).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Log filter, e.g. `debug` or `plexatv=trace`. `RUST_LOG` wins when set.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll on a timer and print the state after every poll.
    Watch {
        /// Seconds between ticks. Polls are still throttled to the
        /// configured minimum interval.
        #[arg(long, default_value_t = 30)]
        tick: u64,

        /// Print one JSON object per poll.
        #[arg(long)]
        json: bool,
    },
    /// Poll once, print the state as JSON and exit.
    Once {
        /// Also print the poll event log to stderr.
        #[arg(long)]
        events: bool,
    },
}

impl Cli {
    /// Load the config file and apply command line overrides.
    pub fn load_config(&self) -> Result<AppConfig, plexatv_core::error::CoreError> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::load()?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(token) = &self.token {
            config.server.token = Some(token.clone());
        }
    }
}
