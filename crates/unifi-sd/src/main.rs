mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use unifi_sd::{Discoverer, StartupError, server};

use crate::cli::{Cli, LogFormat};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    if let Err(err) = run(cli).await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    debug!(path = %cli.config.display(), "loading configuration");
    let config = unifi_sd_config::load_config(&cli.config)?.validate()?;

    if cli.check {
        println!(
            "configuration OK: controller {} site {} listening on {}",
            config.controller_url,
            config.site,
            config.listen_addr()
        );
        return Ok(());
    }

    info!(
        controller = %config.controller_url,
        site = %config.site,
        insecure_https = config.insecure_https,
        session_ttl_secs = config.session_ttl.as_secs(),
        "starting unifi-sd v{}",
        env!("CARGO_PKG_VERSION")
    );

    let discoverer = Arc::new(Discoverer::from_config(&config)?);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    server::serve(listener, discoverer)
        .await
        .map_err(StartupError::Serve)
}
