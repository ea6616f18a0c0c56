use thiserror::Error;

/// Result type alias for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the directory.
///
/// Lookups that find zero or several entries are not errors: the resolver
/// logs them and reports "not found".
#[derive(Debug, Error)]
pub enum Error {
    /// Could not open a connection
    #[error("cannot connect to directory at {url}: {message}")]
    Connect { url: String, message: String },

    /// Bind was rejected
    #[error("directory bind as {dn} failed: {message}")]
    Bind { dn: String, message: String },

    /// Search failed at the protocol level
    #[error("directory search in {base} with {filter} failed: {message}")]
    Search {
        base: String,
        filter: String,
        message: String,
    },

    /// A group contains itself, directly or through nested groups
    #[error("group nesting cycle: {}", chain.join(" -> "))]
    GroupCycle { chain: Vec<String> },

    /// Invalid directory settings
    #[error("invalid directory configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error came from the transport rather than the data
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Bind { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_cycle_display() {
        let err = Error::GroupCycle {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "group nesting cycle: a -> b -> a");
    }

    #[test]
    fn test_is_connection() {
        let err = Error::Bind {
            dn: "cn=admin".into(),
            message: "invalid credentials".into(),
        };
        assert!(err.is_connection());
        assert!(!Error::Config("x".into()).is_connection());
    }
}
