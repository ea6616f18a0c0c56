//! Backend traits and implementations for directory access.
//!
//! A [`Backend`] opens bound [`Session`]s. The production implementation is
//! [`ldap::LdapBackend`]; [`MockBackend`] keeps a small directory in memory
//! for tests.
//!
//! # Testing
//!
//! ```
//! use directory::backend::{Backend, MockBackend};
//! use directory::{Filter, SearchRequest};
//!
//! let mock = MockBackend::new();
//! mock.add_user("uid=alice,ou=people,dc=example,dc=com", "alice", "alice@example.com");
//!
//! let mut session = mock.open().unwrap();
//! let entries = session
//!     .search(&SearchRequest {
//!         base: "ou=people,dc=example,dc=com".into(),
//!         filter: Filter::eq("uid", "alice"),
//!         attrs: vec!["mail".into()],
//!     })
//!     .unwrap();
//! assert_eq!(entries.len(), 1);
//! ```

pub mod ldap;

use crate::dn;
use crate::error::{Error, Result};
use crate::types::{Entry, SearchRequest};
use std::sync::{Arc, Mutex};

/// Opens bound sessions against a directory.
pub trait Backend: Send + Sync {
    /// Connect and bind, returning a session ready to search.
    fn open(&self) -> Result<Box<dyn Session>>;
}

/// A bound directory session.
pub trait Session: Send {
    /// Subtree search below `request.base`.
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<Entry>>;

    /// Whether the underlying connection is closing or already closed.
    fn is_closing(&mut self) -> bool;
}

/// Keeps one session open and replaces it when the server drops it.
///
/// A session that reports it is closing is replaced before the next search.
/// A search that fails on a session which is then found closing is retried
/// once on a fresh session.
pub struct Connection {
    backend: Box<dyn Backend>,
    session: Option<Box<dyn Session>>,
}

impl Connection {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            session: None,
        }
    }

    pub fn search(&mut self, request: &SearchRequest) -> Result<Vec<Entry>> {
        let err = match self.session()?.search(request) {
            Ok(entries) => return Ok(entries),
            Err(err) => err,
        };
        if !self.session.as_mut().is_some_and(|s| s.is_closing()) {
            return Err(err);
        }
        log::warn!("directory session closed during search ({err}), reconnecting");
        self.session()?.search(request)
    }

    fn session(&mut self) -> Result<&mut Box<dyn Session>> {
        let live = match self.session.take() {
            Some(mut s) => {
                if s.is_closing() {
                    log::debug!("directory session is closing, opening a new one");
                    None
                } else {
                    Some(s)
                }
            }
            None => None,
        };
        let session = match live {
            Some(s) => s,
            None => self.backend.open()?,
        };
        Ok(self.session.insert(session))
    }
}

/// In-memory directory for tests.
///
/// Clones share state, so a test can keep a handle for assertions after
/// handing a boxed clone to a resolver.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    entries: Vec<Entry>,
    opens: usize,
    searches: usize,
    closing: bool,
    refuse_bind: bool,
}

impl MockBackend {
    /// Create a new empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw entry.
    pub fn add_entry(&self, entry: Entry) {
        self.state.lock().unwrap().entries.push(entry);
    }

    /// Add an `inetOrgPerson` with `uid`, `mail` and a `cn` taken from the DN.
    pub fn add_user(&self, dn: &str, uid: &str, mail: &str) {
        let cn = dn::leaf_rdn(dn).map(|(_, v)| v).unwrap_or_default();
        let mails: &[&str] = if mail.is_empty() { &[] } else { &[mail] };
        self.add_entry(Entry::new(
            dn,
            &[
                ("objectClass", &["inetOrgPerson"]),
                ("cn", &[cn.as_str()]),
                ("uid", &[uid]),
                ("mail", mails),
            ],
        ));
    }

    /// Add a `groupOfNames` whose `member` attribute holds `members`.
    pub fn add_group(&self, dn: &str, members: &[&str]) {
        let cn = dn::leaf_rdn(dn).map(|(_, v)| v).unwrap_or_default();
        self.add_entry(Entry::new(
            dn,
            &[
                ("objectClass", &["groupOfNames"]),
                ("cn", &[cn.as_str()]),
                ("member", members),
            ],
        ));
    }

    /// Mark every open session as closing, as a server-side disconnect would.
    pub fn close_sessions(&self) {
        self.state.lock().unwrap().closing = true;
    }

    /// Make subsequent binds fail.
    pub fn refuse_bind(&self) {
        self.state.lock().unwrap().refuse_bind = true;
    }

    /// Number of sessions opened so far.
    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    /// Number of searches served so far.
    pub fn searches(&self) -> usize {
        self.state.lock().unwrap().searches
    }
}

impl Backend for MockBackend {
    fn open(&self) -> Result<Box<dyn Session>> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_bind {
            return Err(Error::Bind {
                dn: "cn=mock".to_string(),
                message: "invalid credentials".to_string(),
            });
        }
        state.opens += 1;
        state.closing = false;
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl Session for MockSession {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<Entry>> {
        let mut state = self.state.lock().unwrap();
        if state.closing {
            return Err(Error::Search {
                base: request.base.clone(),
                filter: request.filter.to_string(),
                message: "connection is closing".to_string(),
            });
        }
        state.searches += 1;
        Ok(state
            .entries
            .iter()
            .filter(|e| dn::is_under(&e.dn, &request.base) && request.filter.matches(e))
            .cloned()
            .collect())
    }

    fn is_closing(&mut self) -> bool {
        self.state.lock().unwrap().closing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Filter;

    fn request(uid: &str) -> SearchRequest {
        SearchRequest {
            base: "ou=people,dc=example,dc=com".into(),
            filter: Filter::eq("uid", uid),
            attrs: vec![],
        }
    }

    #[test]
    fn test_mock_search_respects_base() {
        let mock = MockBackend::new();
        mock.add_user("uid=alice,ou=people,dc=example,dc=com", "alice", "");
        mock.add_user("uid=alice,ou=robots,dc=example,dc=com", "alice", "");

        let mut session = mock.open().unwrap();
        assert_eq!(session.search(&request("alice")).unwrap().len(), 1);
    }

    #[test]
    fn test_connection_opens_lazily_once() {
        let mock = MockBackend::new();
        let mut conn = Connection::new(Box::new(mock.clone()));
        assert_eq!(mock.opens(), 0);

        conn.search(&request("alice")).unwrap();
        conn.search(&request("bob")).unwrap();
        assert_eq!(mock.opens(), 1);
        assert_eq!(mock.searches(), 2);
    }

    #[test]
    fn test_connection_reconnects_when_closing() {
        let mock = MockBackend::new();
        mock.add_user("uid=alice,ou=people,dc=example,dc=com", "alice", "");
        let mut conn = Connection::new(Box::new(mock.clone()));

        conn.search(&request("alice")).unwrap();
        mock.close_sessions();

        let entries = conn.search(&request("alice")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(mock.opens(), 2);
    }

    #[test]
    fn test_connection_bind_failure_propagates() {
        let mock = MockBackend::new();
        mock.refuse_bind();
        let mut conn = Connection::new(Box::new(mock));
        assert!(matches!(
            conn.search(&request("alice")),
            Err(Error::Bind { .. })
        ));
    }
}
