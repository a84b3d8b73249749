// # sesid-handler
//
// Thin entry point for one lifecycle event:
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Read the event, run the lifecycle handler against AWS
// 4. Deliver the response document to the event's ResponseURL
//
// All reconciliation logic lives in sesid-core.
//
// ## Configuration
//
// - `SESID_EVENT_FILE`: Path to the event JSON (stdin when unset)
// - `SESID_WAIT_DELAY_SECS`: Base delay between wait attempts (1..=300, default 30)
// - `SESID_WAIT_MAX_ATTEMPTS`: Attempts per wait (1..=100, default 30)
// - `SESID_LOG_LEVEL`: trace, debug, info, warn or error (default info)
// - `SESID_SKIP_NOTIFY`: "true" to print the response without uploading it
// - `SESID_AWS_ENDPOINT_URL`: Override the AWS endpoint (local emulators)
//
// AWS credentials come from the standard provider chain.
//
// ## Example
//
// ```bash
// export SESID_EVENT_FILE=/tmp/create.json
// export SESID_SKIP_NOTIFY=true
//
// sesid-handler
// ```

mod config;
mod notifier;

use anyhow::{Context, Result};
use config::Config;
use notifier::ResponseNotifier;
use sesid_core::{LifecycleEvent, LifecycleHandler};
use sesid_provider_aws::AwsServiceFactory;
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// A FAILED response that was delivered still counts as a clean exit.
#[derive(Debug, Clone, Copy)]
enum HandlerExitCode {
    /// Response produced (and delivered unless skipped)
    Done = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unreadable event, undeliverable response)
    RuntimeError = 2,
}

impl From<HandlerExitCode> for ExitCode {
    fn from(code: HandlerExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return HandlerExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return HandlerExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr; stdout carries the response document
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HandlerExitCode::ConfigError.into();
    }

    info!("Starting sesid-handler");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HandlerExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_handler(config).await {
            error!("Handler error: {:#}", e);
            HandlerExitCode::RuntimeError
        } else {
            HandlerExitCode::Done
        }
    });

    result.into()
}

/// Handle one event end to end
async fn run_handler(config: Config) -> Result<()> {
    let event = read_event(&config)?;
    info!("Received {:?} for {}", event.request_type, event.logical_resource_id);

    let mut factory = AwsServiceFactory::new();
    if let Some(ref endpoint_url) = config.aws_endpoint_url {
        factory = factory.with_endpoint_url(endpoint_url);
    }

    let handler = LifecycleHandler::new(Arc::new(factory), config.engine());
    let response = handler.handle(&event).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to encode response")?
    );

    if config.skip_notify {
        info!("SESID_SKIP_NOTIFY set, not uploading the response");
        return Ok(());
    }

    ResponseNotifier::new()?
        .send(&event.response_url, &response)
        .await
}

/// Read and decode the event from the configured file or stdin
fn read_event(config: &Config) -> Result<LifecycleEvent> {
    let raw = match config.event_file {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read event from stdin")?;
            buffer
        }
    };

    serde_json::from_str(&raw).context("Failed to decode lifecycle event")
}
