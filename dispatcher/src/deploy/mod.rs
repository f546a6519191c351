//! External deployment procedure

pub mod script;

use async_trait::async_trait;

use crate::errors::DispatchError;

/// Runs one deployment of a released version.
///
/// Implementations return an error carrying the failure detail that ends up
/// in the deployment status.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Deploy `version`, returning only once the deployment has finished
    async fn deploy(&self, version: &str) -> Result<(), DispatchError>;

    /// Target environment label
    fn environment(&self) -> &str;
}
