use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Connection and schema settings for the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Whether directory-backed membership is used at all
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Connect with `ldaps://`
    pub use_tls: bool,
    /// Upgrade a plain connection with StartTLS
    pub start_tls: bool,
    pub insecure_skip_verify: bool,
    pub bind_dn: String,
    #[serde(skip_serializing)]
    pub bind_password: String,
    pub user_search_base: String,
    pub user_name_attribute: String,
    pub user_mail_attribute: String,
    pub user_object_class: String,
    pub group_search_base: String,
    /// Attribute on a group entry listing its members
    pub group_attribute: String,
    pub group_object_class: String,
    /// Origin label given to accounts provisioned from the directory
    pub origin: String,
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: 389,
            use_tls: false,
            start_tls: false,
            insecure_skip_verify: false,
            bind_dn: String::new(),
            bind_password: String::new(),
            user_search_base: String::new(),
            user_name_attribute: "uid".to_string(),
            user_mail_attribute: "mail".to_string(),
            user_object_class: "inetOrgPerson".to_string(),
            group_search_base: String::new(),
            group_attribute: "member".to_string(),
            group_object_class: "groupOfNames".to_string(),
            origin: "ldap".to_string(),
            timeout_secs: 30,
        }
    }
}

impl DirectoryConfig {
    /// Connection URL derived from host, port and TLS mode
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Check the settings needed to search are present
    ///
    /// A disabled directory is always valid.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let required = [
            ("host", &self.host),
            ("user_search_base", &self.user_search_base),
            ("group_search_base", &self.group_search_base),
            ("user_name_attribute", &self.user_name_attribute),
            ("group_attribute", &self.group_attribute),
            ("origin", &self.origin),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{field} must be set when enabled")));
            }
        }
        if self.use_tls && self.start_tls {
            return Err(Error::Config(
                "use_tls and start_tls are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A user resolved from the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryIdentity {
    /// Distinguished name of the entry
    pub dn: String,
    /// Value of the configured username attribute
    pub username: String,
    /// Value of the configured mail attribute, empty when absent
    pub email: String,
}

/// One entry returned by a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl Entry {
    /// Create an entry from attribute name/value pairs
    pub fn new(dn: impl Into<String>, attrs: &[(&str, &[&str])]) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, values) in attrs {
            map.entry((*name).to_string())
                .or_default()
                .extend(values.iter().map(|v| (*v).to_string()));
        }
        Self {
            dn: dn.into(),
            attrs: map,
        }
    }

    /// All values of an attribute (attribute names are case-insensitive)
    pub fn values(&self, attr: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attr))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value of an attribute
    pub fn first(&self, attr: &str) -> Option<&str> {
        self.values(attr).first().map(String::as_str)
    }
}

/// A search filter, rendered to RFC 4515 text for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `(attr=value)`, value escaped on render
    Eq(String, String),
    /// `(&...)`
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(attr.into(), value.into())
    }

    /// Evaluate the filter locally (values compare case-insensitively)
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Self::Eq(attr, value) => entry
                .values(attr)
                .iter()
                .any(|v| v.eq_ignore_ascii_case(value)),
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq(attr, value) => write!(f, "({}={})", attr, ldap3::ldap_escape(value.as_str())),
            Self::And(filters) => {
                write!(f, "(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A subtree search below `base`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub filter: Filter,
    pub attrs: Vec<String>,
}
