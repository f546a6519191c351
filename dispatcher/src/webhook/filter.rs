//! Decides which release notifications trigger a deployment

use std::fmt;

use crate::models::release::ReleaseNotification;

/// Event type that can trigger a deployment
pub const RELEASE_EVENT: &str = "release";

/// Release action that can trigger a deployment
pub const PUBLISHED_ACTION: &str = "published";

/// Outcome of filtering one notification. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Not a release event
    WrongEvent(String),
    /// A release event other than `published`
    WrongAction(String),
    Draft,
    Prerelease,
    /// Stable published release, carries the version to deploy
    Accepted(String),
}

impl FilterDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterDecision::Accepted(_))
    }
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterDecision::WrongEvent(event) => write!(f, "Event type {} ignored", event),
            FilterDecision::WrongAction(action) => write!(f, "Action {} ignored", action),
            FilterDecision::Draft => write!(f, "Draft release ignored"),
            FilterDecision::Prerelease => write!(f, "Prerelease ignored"),
            FilterDecision::Accepted(version) => {
                write!(f, "Deployment triggered for version: {}", version)
            }
        }
    }
}

/// First check, usable before the body is authenticated or parsed
pub fn check_event(event_type: &str) -> Option<FilterDecision> {
    (event_type != RELEASE_EVENT).then(|| FilterDecision::WrongEvent(event_type.to_string()))
}

/// Run every check in order and stop at the first one that rejects
pub fn evaluate(event_type: &str, payload: &ReleaseNotification) -> FilterDecision {
    if let Some(decision) = check_event(event_type) {
        return decision;
    }
    if payload.action != PUBLISHED_ACTION {
        return FilterDecision::WrongAction(payload.action.clone());
    }
    if payload.release.draft {
        return FilterDecision::Draft;
    }
    if payload.release.prerelease {
        return FilterDecision::Prerelease;
    }
    FilterDecision::Accepted(payload.version().to_string())
}
