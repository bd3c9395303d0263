//! asset-courier binary
//!
//! Exit codes: `0` a location was published, `1` configuration or fatal error,
//! `2` no complete group in any location, `3` nothing published after a failed download.

use asset_courier::{
    Config, Pipeline, Result, RunOutcome, S3ObjectStore, TelegramChannel, ToExitCode, logging,
};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init(None).ok();
            tracing::error!(error = %e, code = e.error_code(), "invalid configuration");
            return ExitCode::from(e.exit_code());
        }
    };

    if let Err(e) = logging::init(config.paths.log_file.as_deref()) {
        eprintln!("asset-courier: {e}");
        return ExitCode::from(e.exit_code());
    }

    match run(config).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            tracing::error!(error = %e, code = e.error_code(), "run aborted");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(config: Config) -> Result<RunOutcome> {
    let store = Arc::new(S3ObjectStore::new(&config.store).await);
    let channel = Arc::new(TelegramChannel::new(&config.delivery)?);
    let send_probe = config.delivery.send_probe_message;

    let pipeline = Pipeline::new(config, store, channel)?;
    let outcome = pipeline.run().await?;

    if send_probe {
        pipeline.probe_channel().await;
    }
    Ok(outcome)
}
