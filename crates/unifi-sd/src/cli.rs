use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use unifi_sd_config::{CONFIG_FILE_ENV, DEFAULT_CONFIG_FILE};

/// Prometheus HTTP service discovery for UniFi network devices.
///
/// Serves a target list of blackbox exporter ICMP probes, one per device
/// managed by the configured UniFi controller site.
#[derive(Debug, Parser)]
#[command(name = "unifi-sd", version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, env = CONFIG_FILE_ENV, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Validate the configuration and exit without serving
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
