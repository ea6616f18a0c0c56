//! Errors surfaced by the reconcilers
//!
//! Every fatal error names the resource kind, org/space and role it came
//! from. Soft failures (unresolved directory users, skipped provisioning)
//! never appear here; they are only logged.

use crate::platform::{PlatformError, Role, Target};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Missing or invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The directory could not be searched (bind, search, group cycle)
    #[error("directory lookup for {role} in {target} failed: {source}")]
    Directory {
        target: Target,
        role: Role,
        #[source]
        source: directory::Error,
    },

    /// An account could not be created
    #[error("could not provision account {username}: {source}")]
    IdentityProvision {
        username: String,
        #[source]
        source: identity::Error,
    },

    /// A role grant failed
    #[error("could not grant {role} to {username} in {target}: {source}")]
    Membership {
        target: Target,
        role: Role,
        username: String,
        #[source]
        source: PlatformError,
    },

    /// An explicitly configured user has no account
    #[error(
        "user {username} configured as {role} in {target} does not exist in the identity service: must add internal user first"
    )]
    MissingAccount {
        target: Target,
        role: Role,
        username: String,
    },

    /// One or more role revocations failed; every revoke was attempted
    #[error("could not revoke {role} in {target} from: {}", .failures.join("; "))]
    Revoke {
        target: Target,
        role: Role,
        failures: Vec<String>,
    },

    /// Current state could not be listed completely
    #[error("could not list {what}: {source}")]
    Listing {
        what: String,
        #[source]
        source: BoxError,
    },

    /// A create, update or delete of a resource failed
    #[error("could not {action} {kind} {name}: {source}")]
    Resource {
        kind: &'static str,
        action: &'static str,
        name: String,
        #[source]
        source: PlatformError,
    },
}

impl SyncError {
    pub fn listing(what: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Listing {
            what: what.into(),
            source: source.into(),
        }
    }

    pub fn resource(
        kind: &'static str,
        action: &'static str,
        name: impl Into<String>,
    ) -> impl FnOnce(PlatformError) -> Self {
        let name = name.into();
        move |source| Self::Resource {
            kind,
            action,
            name,
            source,
        }
    }

    /// Whether re-running without a config change could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Membership { source, .. } | Self::Resource { source, .. } => {
                source.is_retryable()
            }
            Self::IdentityProvision { source, .. } => source.is_retryable(),
            Self::Directory { source, .. } => source.is_connection(),
            Self::Listing { source, .. } => {
                source
                    .downcast_ref::<PlatformError>()
                    .is_some_and(PlatformError::is_retryable)
                    || source
                        .downcast_ref::<identity::Error>()
                        .is_some_and(identity::Error::is_retryable)
            }
            _ => false,
        }
    }
}
