//! `orgsync.toml`: desired state and connection settings
//!
//! ```toml
//! [platform]
//! api_url = "https://api.sys.example.com"
//!
//! [identity]
//! uaa_url = "https://uaa.sys.example.com"
//!
//! [directory]
//! enabled = true
//! host = "ldap.example.com"
//! bind_dn = "cn=admin,dc=example,dc=com"
//! user_search_base = "ou=people,dc=example,dc=com"
//! group_search_base = "ou=groups,dc=example,dc=com"
//!
//! [cleanup]
//! orgs = true
//! protected_orgs = ["p-spring-cloud-services"]
//!
//! [[orgs]]
//! name = "acme"
//! quota = "default"
//! managers = { ldap_groups = ["acme-admins"], remove_users = true }
//!
//! [[orgs.spaces]]
//! name = "dev"
//! developers = { ldap_groups = ["acme-devs"], saml_users = ["ops@acme.com"] }
//! ```
//!
//! Tokens and the directory bind password can come from the environment
//! instead of the file.

use crate::error::SyncError;
use crate::platform::QuotaLimits;
use directory::DirectoryConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformConfig,
    pub identity: IdentityConfig,
    pub directory: DirectoryConfig,
    pub federation: FederationConfig,
    pub cleanup: CleanupConfig,
    pub orgs: Vec<OrgConfig>,
    pub security_groups: Vec<SecurityGroupConfig>,
    pub isolation_segments: Vec<IsolationSegmentConfig>,
    pub shared_domains: Vec<SharedDomainConfig>,
    pub quotas: Vec<QuotaConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub api_url: String,
    #[serde(skip_serializing)]
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub uaa_url: String,
    #[serde(skip_serializing)]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    /// Origin given to accounts created for `saml_users`
    pub origin: String,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            origin: "saml".to_string(),
        }
    }
}

/// Which resource kinds may have extra items deleted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub orgs: bool,
    pub spaces: bool,
    pub security_groups: bool,
    pub isolation_segments: bool,
    pub shared_domains: bool,
    /// Orgs never deleted, in addition to `system`
    pub protected_orgs: Vec<String>,
}

/// Who should hold one role, drawn from four sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleUsers {
    pub ldap_groups: Vec<String>,
    pub ldap_users: Vec<String>,
    /// Existing platform accounts, by username
    pub users: Vec<String>,
    /// Federated accounts, by email
    pub saml_users: Vec<String>,
    /// Revoke the role from anyone not listed
    pub remove_users: bool,
}

impl RoleUsers {
    pub fn uses_directory(&self) -> bool {
        !self.ldap_groups.is_empty() || !self.ldap_users.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgConfig {
    pub name: String,
    pub quota: Option<String>,
    pub managers: RoleUsers,
    pub auditors: RoleUsers,
    pub billing_managers: RoleUsers,
    /// Rejected by validation: developers are a space role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developers: Option<RoleUsers>,
    pub spaces: Vec<SpaceConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    pub name: String,
    pub developers: RoleUsers,
    pub managers: RoleUsers,
    pub auditors: RoleUsers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupConfig {
    pub name: String,
    pub rules: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationSegmentConfig {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDomainConfig {
    pub name: String,
    #[serde(default)]
    pub internal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub name: String,
    #[serde(flatten)]
    pub limits: QuotaLimits,
}

impl Config {
    /// Read, parse and validate a config file
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("could not read {}: {e}", path.display()))
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            SyncError::Config(msg) => SyncError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        log::debug!(
            "loaded {} orgs and {} security groups from {}",
            config.orgs.len(),
            config.security_groups.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self, SyncError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SyncError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Fill secrets from the environment; values already in the file win
    /// only when the environment has none.
    pub fn apply_secrets(
        &mut self,
        platform_token: Option<String>,
        uaa_token: Option<String>,
        ldap_password: Option<String>,
    ) {
        if let Some(token) = platform_token {
            self.platform.token = token;
        }
        if let Some(token) = uaa_token {
            self.identity.token = token;
        }
        if let Some(password) = ldap_password {
            self.directory.bind_password = password;
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        self.directory
            .validate()
            .map_err(|e| SyncError::Config(format!("[directory]: {e}")))?;

        if self.federation.origin.trim().is_empty() {
            return Err(SyncError::Config(
                "[federation] origin must not be empty".to_string(),
            ));
        }

        let mut orgs = HashSet::new();
        for org in &self.orgs {
            if org.name.trim().is_empty() {
                return Err(SyncError::Config("org with empty name".to_string()));
            }
            if !orgs.insert(org.name.to_lowercase()) {
                return Err(SyncError::Config(format!("duplicate org {}", org.name)));
            }
            if org.developers.is_some() {
                return Err(SyncError::Config(format!(
                    "org {} declares developers; developers can only be set on spaces",
                    org.name
                )));
            }

            let mut spaces = HashSet::new();
            for space in &org.spaces {
                if space.name.trim().is_empty() {
                    return Err(SyncError::Config(format!(
                        "space with empty name in org {}",
                        org.name
                    )));
                }
                if !spaces.insert(space.name.to_lowercase()) {
                    return Err(SyncError::Config(format!(
                        "duplicate space {} in org {}",
                        space.name, org.name
                    )));
                }
            }
        }

        if !self.directory.enabled && self.any_role(RoleUsers::uses_directory) {
            log::warn!("ldap groups or users are configured but [directory] is not enabled");
        }

        Ok(())
    }

    fn any_role(&self, pred: impl Fn(&RoleUsers) -> bool) -> bool {
        self.orgs.iter().any(|org| {
            [&org.managers, &org.auditors, &org.billing_managers]
                .into_iter()
                .any(&pred)
                || org
                    .spaces
                    .iter()
                    .flat_map(|s| [&s.developers, &s.managers, &s.auditors])
                    .any(&pred)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXAMPLE: &str = r#"
[platform]
api_url = "https://api.example.com"

[directory]
enabled = true
host = "ldap.example.com"
user_search_base = "ou=people,dc=example,dc=com"
group_search_base = "ou=groups,dc=example,dc=com"

[cleanup]
orgs = true
protected_orgs = ["keep-me"]

[[orgs]]
name = "acme"
quota = "small"
managers = { users = ["admin"], remove_users = true }

[[orgs.spaces]]
name = "dev"

[orgs.spaces.developers]
ldap_groups = ["space-devs"]
saml_users = ["ops@acme.com"]

[[security_groups]]
name = "dns-out"
rules = [{ protocol = "udp", destination = "0.0.0.0/0", ports = "53" }]

[[shared_domains]]
name = "apps.internal"
internal = true

[[quotas]]
name = "small"
total_memory_mb = 10240
paid_services_allowed = false
"#;

    #[test]
    fn test_parse_example() {
        let config = Config::parse(EXAMPLE).unwrap();
        assert_eq!(config.federation.origin, "saml");
        assert_eq!(config.directory.port, 389);
        assert_eq!(config.directory.origin, "ldap");
        assert!(config.cleanup.orgs);
        assert!(!config.cleanup.spaces);

        let org = &config.orgs[0];
        assert_eq!(org.quota.as_deref(), Some("small"));
        assert!(org.managers.remove_users);
        assert_eq!(org.managers.users, vec!["admin"]);
        assert_eq!(org.spaces[0].developers.ldap_groups, vec!["space-devs"]);
        assert!(org.spaces[0].managers.ldap_groups.is_empty());

        assert_eq!(config.security_groups[0].rules[0]["ports"], "53");
        assert!(config.shared_domains[0].internal);
        assert_eq!(config.quotas[0].limits.total_memory_mb, Some(10240));
        assert!(!config.quotas[0].limits.paid_services_allowed);
    }

    #[test]
    fn test_duplicate_org_rejected() {
        let err = Config::parse("[[orgs]]\nname = \"a\"\n[[orgs]]\nname = \"A\"\n").unwrap_err();
        assert!(err.to_string().contains("duplicate org A"));
    }

    #[test]
    fn test_duplicate_space_rejected() {
        let content = r#"
[[orgs]]
name = "acme"
[[orgs.spaces]]
name = "dev"
[[orgs.spaces]]
name = "dev"
"#;
        let err = Config::parse(content).unwrap_err();
        assert!(err.to_string().contains("duplicate space dev in org acme"));
    }

    #[test]
    fn test_org_developers_rejected() {
        let content = r#"
[[orgs]]
name = "acme"
developers = { users = ["alice"] }
"#;
        let err = Config::parse(content).unwrap_err();
        assert!(err.to_string().contains("developers"));
    }

    #[test]
    fn test_directory_enabled_requires_settings() {
        let err = Config::parse("[directory]\nenabled = true\n").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_secrets_from_environment() {
        let mut config = Config::parse(EXAMPLE).unwrap();
        config.apply_secrets(Some("cc-token".into()), None, Some("s3cret".into()));
        assert_eq!(config.platform.token, "cc-token");
        assert_eq!(config.identity.token, "");
        assert_eq!(config.directory.bind_password, "s3cret");

        let rendered = toml::to_string(&config.platform).unwrap();
        assert!(!rendered.contains("cc-token"));
        let rendered = toml::to_string(&config.directory).unwrap();
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.orgs.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("orgsync.toml")).unwrap_err();
        assert!(err.to_string().contains("could not read"));
    }
}
