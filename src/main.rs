use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deployctl::{
    cli::{self, Cli},
    config::{Config, LogFormat},
    error::EXIT_CALL_FAILED,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env has to be in the environment before clap reads DEPLOYCTL_PASSWORD / DEPLOYCTL_URL
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_CALL_FAILED);
        }
    };

    init_tracing(config.log_format);

    let operation = cli.command.operation();
    if let Err(e) = cli::run(cli, &config).await {
        tracing::error!(%operation, error = %e, "Command failed");
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

/// Logs go to stderr so --dry-run output on stdout stays clean
fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    );

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
