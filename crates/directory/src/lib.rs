//! # directory
//!
//! Resolves directory (LDAP) groups to their flattened member lists and
//! member values to user identities.
//!
//! ## Group resolution
//!
//! A group is found by exact common name below the group search base. Each
//! value of its member attribute is either a nested group (its DN lies below
//! the group search base *and* a group search by its leaf name finds exactly
//! one entry) or a leaf member. Nested groups are expanded recursively and
//! the result is deduplicated by raw member value.
//!
//! A group that contains itself, directly or transitively, is an
//! [`Error::GroupCycle`]. A group name that matches zero or several entries
//! resolves to no members and is logged.
//!
//! ## Caching
//!
//! A [`Resolver`] lives for one reconciliation run. Group memberships are
//! cached by group name and user lookups by rendered search filter, so
//! repeated lookups within the run never hit the server twice.
//!
//! ## Example
//!
//! ```
//! use directory::{DirectoryConfig, Resolver};
//! use directory::backend::MockBackend;
//!
//! let mock = MockBackend::new();
//! mock.add_user("uid=alice,ou=people,dc=example,dc=com", "alice", "alice@example.com");
//! mock.add_group(
//!     "cn=space-devs,ou=groups,dc=example,dc=com",
//!     &["uid=alice,ou=people,dc=example,dc=com"],
//! );
//!
//! let config = DirectoryConfig {
//!     enabled: true,
//!     host: "ldap.example.com".into(),
//!     user_search_base: "ou=people,dc=example,dc=com".into(),
//!     group_search_base: "ou=groups,dc=example,dc=com".into(),
//!     ..DirectoryConfig::default()
//! };
//!
//! let mut resolver = Resolver::with_backend(config, Box::new(mock));
//! let members = resolver.group_members("space-devs").unwrap();
//! let alice = resolver.user_by_member(&members[0]).unwrap().unwrap();
//! assert_eq!(alice.username, "alice");
//! ```

#![warn(clippy::all)]

/// Backend implementations for directory sessions.
pub mod backend;
/// Distinguished-name parsing helpers.
pub mod dn;
/// Error types for directory operations.
pub mod error;
/// Configuration, entries, filters and identities.
pub mod types;

pub use error::{Error, Result};
pub use types::{DirectoryConfig, DirectoryIdentity, Entry, Filter, SearchRequest};

use backend::ldap::LdapBackend;
use backend::{Backend, Connection};
use std::collections::{HashMap, HashSet};

/// Run-scoped directory resolver with group and user caches.
pub struct Resolver {
    config: DirectoryConfig,
    conn: Connection,
    groups: HashMap<String, Vec<String>>,
    users: HashMap<String, Option<DirectoryIdentity>>,
}

impl Resolver {
    /// Create a resolver talking to the configured LDAP server.
    ///
    /// No connection is made until the first search.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        let backend = LdapBackend::new(config.clone());
        Self::with_backend(config, Box::new(backend))
    }

    /// Create a resolver over a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(config: DirectoryConfig, backend: Box<dyn Backend>) -> Self {
        Self {
            config,
            conn: Connection::new(backend),
            groups: HashMap::new(),
            users: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Flattened raw member values of a group, nested groups expanded.
    pub fn group_members(&mut self, group: &str) -> Result<Vec<String>> {
        let mut path = Vec::new();
        self.resolve_group(group, &mut path)
    }

    fn resolve_group(&mut self, group: &str, path: &mut Vec<String>) -> Result<Vec<String>> {
        let key = group.to_lowercase();
        if let Some(cached) = self.groups.get(&key) {
            log::trace!("group {group} served from cache");
            return Ok(cached.clone());
        }
        if path.contains(&key) {
            let mut chain = path.clone();
            chain.push(key);
            return Err(Error::GroupCycle { chain });
        }

        let Some(entry) = self.find_group(group)? else {
            self.groups.insert(key, Vec::new());
            return Ok(Vec::new());
        };

        path.push(key.clone());
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for raw in entry.values(&self.config.group_attribute).to_vec() {
            match self.nested_group(&raw)? {
                Some(nested) => {
                    log::debug!("group {group} nests group {nested}");
                    for member in self.resolve_group(&nested, path)? {
                        if seen.insert(member.clone()) {
                            members.push(member);
                        }
                    }
                }
                None => {
                    if seen.insert(raw.clone()) {
                        members.push(raw);
                    }
                }
            }
        }
        path.pop();

        log::debug!("group {group} resolved to {} members", members.len());
        self.groups.insert(key, members.clone());
        Ok(members)
    }

    /// Exactly one group entry with this common name, or `None`
    fn find_group(&mut self, name: &str) -> Result<Option<Entry>> {
        let request = SearchRequest {
            base: self.config.group_search_base.clone(),
            filter: self.group_filter(name),
            attrs: vec![self.config.group_attribute.clone(), "cn".to_string()],
        };
        let mut entries = self.conn.search(&request)?;
        match entries.len() {
            1 => Ok(entries.pop()),
            0 => {
                log::warn!("directory group {name} not found");
                Ok(None)
            }
            n => {
                log::warn!("directory group {name} is ambiguous ({n} matches), ignoring");
                Ok(None)
            }
        }
    }

    /// Leaf name of `member` when it denotes a group
    fn nested_group(&mut self, member: &str) -> Result<Option<String>> {
        if !dn::is_under(member, &self.config.group_search_base) {
            return Ok(None);
        }
        let Some((_, name)) = dn::leaf_rdn(member) else {
            return Ok(None);
        };
        let request = SearchRequest {
            base: self.config.group_search_base.clone(),
            filter: self.group_filter(&name),
            attrs: vec!["cn".to_string()],
        };
        let entries = self.conn.search(&request)?;
        Ok((entries.len() == 1).then_some(name))
    }

    fn group_filter(&self, name: &str) -> Filter {
        Filter::And(vec![
            Filter::eq("objectClass", self.config.group_object_class.as_str()),
            Filter::eq("cn", name),
        ])
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Resolve a raw group member value: DNs by DN, anything else by identifier.
    pub fn user_by_member(&mut self, member: &str) -> Result<Option<DirectoryIdentity>> {
        if dn::is_dn(member) {
            self.user_by_dn(member)
        } else {
            self.user_by_id(member)
        }
    }

    /// Look a user up by the configured username attribute.
    pub fn user_by_id(&mut self, id: &str) -> Result<Option<DirectoryIdentity>> {
        let filter = self.user_filter(&self.config.user_name_attribute, id);
        self.lookup_user(filter)
    }

    /// Look a user up by the leaf RDN of its DN.
    pub fn user_by_dn(&mut self, dn: &str) -> Result<Option<DirectoryIdentity>> {
        let Some((attr, value)) = dn::leaf_rdn(dn) else {
            log::warn!("cannot parse directory DN {dn}");
            return Ok(None);
        };
        let filter = self.user_filter(&attr, &value);
        self.lookup_user(filter)
    }

    fn user_filter(&self, attr: &str, value: &str) -> Filter {
        Filter::And(vec![
            Filter::eq("objectClass", self.config.user_object_class.as_str()),
            Filter::eq(attr, value),
        ])
    }

    fn lookup_user(&mut self, filter: Filter) -> Result<Option<DirectoryIdentity>> {
        let key = filter.to_string();
        if let Some(hit) = self.users.get(&key) {
            return Ok(hit.clone());
        }

        let request = SearchRequest {
            base: self.config.user_search_base.clone(),
            filter,
            attrs: vec![
                self.config.user_name_attribute.clone(),
                self.config.user_mail_attribute.clone(),
            ],
        };
        let entries = self.conn.search(&request)?;
        let identity = match entries.as_slice() {
            [entry] => self.identity_from(entry),
            [] => {
                log::warn!("no directory user matches {key}");
                None
            }
            many => {
                log::warn!(
                    "{} directory users match {key}, treating as not found",
                    many.len()
                );
                None
            }
        };

        self.users.insert(key, identity.clone());
        Ok(identity)
    }

    fn identity_from(&self, entry: &Entry) -> Option<DirectoryIdentity> {
        let Some(username) = entry.first(&self.config.user_name_attribute) else {
            log::warn!(
                "directory entry {} has no {} attribute",
                entry.dn,
                self.config.user_name_attribute
            );
            return None;
        };
        Some(DirectoryIdentity {
            dn: entry.dn.clone(),
            username: username.to_string(),
            email: entry
                .first(&self.config.user_mail_attribute)
                .unwrap_or_default()
                .to_string(),
        })
    }
}
