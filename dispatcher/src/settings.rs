//! Process settings sourced from environment variables

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::errors::DispatchError;
use crate::logs::LogLevel;

/// Dispatcher settings.
///
/// Every field maps to the upper-case environment variable of the same name
/// (`PORT`, `WEBHOOK_SECRET`, `DEPLOY_SCRIPT`, ...). Variables that are set
/// but empty count as unset.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Interface to bind the HTTP server to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared HMAC secret; empty disables signature verification
    #[serde(default = "default_webhook_secret")]
    pub webhook_secret: SecretString,

    /// External deploy procedure, invoked as `<script> <version> <environment>`
    #[serde(default = "default_deploy_script")]
    pub deploy_script: PathBuf,

    /// Deployment environment label passed to the deploy script
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Maximum number of pending deployments
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Kill the deploy script after this many seconds (unset: wait forever)
    #[serde(default)]
    pub deploy_timeout_secs: Option<u64>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs on stdout
    #[serde(default)]
    pub log_json: bool,

    /// Directory for an additional log file
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Upper bound on graceful shutdown
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_webhook_secret() -> SecretString {
    SecretString::from(String::new())
}

fn default_deploy_script() -> PathBuf {
    PathBuf::from("/opt/simple-go-app/deploy/deploy.sh")
}

fn default_environment() -> String {
    "prod".to_string()
}

fn default_queue_capacity() -> usize {
    10
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_secret: default_webhook_secret(),
            deploy_script: default_deploy_script(),
            environment: default_environment(),
            queue_capacity: default_queue_capacity(),
            deploy_timeout_secs: None,
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, DispatchError> {
        Self::load(config::Environment::default().ignore_empty(true))
    }

    /// Load settings from an explicit variable map instead of the process
    /// environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, DispatchError> {
        Self::load(
            config::Environment::default()
                .ignore_empty(true)
                .source(Some(vars)),
        )
    }

    fn load(source: config::Environment) -> Result<Self, DispatchError> {
        let settings: Settings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), DispatchError> {
        if self.queue_capacity == 0 {
            return Err(DispatchError::ConfigError(
                "QUEUE_CAPACITY must be at least 1".to_string(),
            ));
        }
        if self.environment.is_empty() {
            return Err(DispatchError::ConfigError(
                "ENVIRONMENT must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn deploy_timeout(&self) -> Option<Duration> {
        self.deploy_timeout_secs.map(Duration::from_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
