//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use crate::queue::DEFAULT_CAPACITY;
use crate::settings::Settings;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Deploy script configuration
    pub deploy: DeployOptions,

    /// Maximum number of pending deployments
    pub queue_capacity: usize,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions::default(),
            deploy: DeployOptions::default(),
            queue_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            lifecycle: LifecycleOptions {
                max_shutdown_delay: settings.shutdown_timeout(),
            },
            server: ServerOptions {
                host: settings.host.clone(),
                port: settings.port,
            },
            deploy: DeployOptions {
                script: settings.deploy_script.clone(),
                environment: settings.environment.clone(),
                timeout: settings.deploy_timeout(),
            },
            queue_capacity: settings.queue_capacity,
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Deploy script options
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Script invoked as `<script> <version> <environment>`
    pub script: PathBuf,

    /// Environment label passed as second argument
    pub environment: String,

    /// Optional upper bound on a single deployment
    pub timeout: Option<Duration>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            script: PathBuf::from("/opt/simple-go-app/deploy/deploy.sh"),
            environment: "prod".to_string(),
            timeout: None,
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
        }
    }
}
