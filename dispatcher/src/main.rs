//! Release Dispatcher - Entry Point
//!
//! Listens for "release published" webhooks and runs the deploy script for
//! each new stable release, one at a time.

use std::env;
use std::sync::Arc;

use release_dispatcher::app::options::AppOptions;
use release_dispatcher::app::run::run;
use release_dispatcher::deploy::script::ScriptDeployer;
use release_dispatcher::logs::{init_logging, LogOptions};
use release_dispatcher::settings::Settings;
use release_dispatcher::utils::version_info;
use release_dispatcher::webhook::signature::SignatureVerifier;

use secrecy::ExposeSecret;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Print version and exit
    let version = version_info();
    if env::args().skip(1).any(|arg| arg == "--version" || arg == "-V") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render version info: {e}"),
        }
        return;
    }

    // Read settings from the environment
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    info!(
        "Release dispatcher {} ({}, built {})",
        version.version, version.git_hash, version.build_time
    );
    info!("Configuration:");
    info!("   - Deploy Script: {}", settings.deploy_script.display());
    info!("   - Environment: {}", settings.environment);
    info!("   - Queue Capacity: {}", settings.queue_capacity);
    match settings.deploy_timeout() {
        Some(timeout) => info!("   - Deploy Timeout: {}s", timeout.as_secs()),
        None => info!("   - Deploy Timeout: none"),
    }
    if settings.webhook_secret.expose_secret().is_empty() {
        warn!("   - Webhook Secret: not configured, signatures will not be checked");
    } else {
        info!("   - Webhook Secret: configured");
    }

    if !settings.deploy_script.exists() {
        warn!(
            "Deploy script not found: {}",
            settings.deploy_script.display()
        );
    }

    let options = AppOptions::from(&settings);
    let verifier = SignatureVerifier::from_secret(settings.webhook_secret);
    let deployer = ScriptDeployer::new(
        options.deploy.script.clone(),
        options.deploy.environment.clone(),
    )
    .with_timeout(options.deploy.timeout);

    info!("Running release dispatcher with options: {:?}", options);
    let result = run(options, verifier, Arc::new(deployer), await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the dispatcher: {e}");
        std::process::exit(1);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Failed to install signal handlers, falling back to Ctrl+C");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Ctrl+C received, shutting down...");
                    }
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
