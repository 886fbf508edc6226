//! Configuration and CLI argument handling

use std::time::Duration;
use clap::{Parser, ValueEnum};

use crate::state::TimerSettings;

/// Which notification sink to use when a rest completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifierKind {
    /// Log the completion only
    Log,
    /// Show a desktop notification with sound
    Desktop,
}

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "rest-timer")]
#[command(about = "Rest timer daemon for workout tracking front ends")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Default rest duration in seconds when a start request carries none
    #[arg(short = 'r', long, default_value = "90")]
    pub default_rest: u64,

    /// Seconds a completed timer stays visible before returning to idle
    #[arg(long, default_value = "5")]
    pub auto_hide: u64,

    /// Ticker period in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Window in milliseconds in which a repeated start for the same movement is ignored
    #[arg(long, default_value = "2000")]
    pub duplicate_window_ms: u64,

    /// Notification sink for completed rests
    #[arg(long, value_enum, default_value = "log")]
    pub notifier: NotifierKind,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Timer settings derived from the command line
    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            tick_interval: Duration::from_millis(self.tick_ms),
            auto_hide_after: Duration::from_secs(self.auto_hide),
            duplicate_window: Duration::from_millis(self.duplicate_window_ms),
        }
    }
}
