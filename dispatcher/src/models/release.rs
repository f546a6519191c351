//! Release notification payload

use serde::{Deserialize, Serialize};

/// A repository "release" webhook payload.
///
/// Only the fields the dispatcher looks at are modelled; anything missing
/// falls back to its empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNotification {
    /// Release action, e.g. `published`, `created`, `edited`
    #[serde(default)]
    pub action: String,

    #[serde(default)]
    pub release: Release,

    #[serde(default)]
    pub repository: Repository,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Version identifier handed to the deploy script
    #[serde(default)]
    pub tag_name: String,

    /// Display name; GitHub sends `null` when the release is untitled
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub prerelease: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub full_name: String,
}

impl ReleaseNotification {
    pub fn version(&self) -> &str {
        &self.release.tag_name
    }
}
