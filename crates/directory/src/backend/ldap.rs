//! LDAP backend.
//!
//! Uses the blocking [`ldap3::LdapConn`]: every search is a synchronous
//! round-trip, matching the single-threaded reconciliation loop.

use crate::backend::{Backend, Session};
use crate::error::{Error, Result};
use crate::types::{DirectoryConfig, Entry, SearchRequest};
use ldap3::{LdapConn, LdapConnSettings, Scope, SearchEntry};
use std::time::Duration;

/// Opens simple-bound sessions against an LDAP server.
pub struct LdapBackend {
    config: DirectoryConfig,
}

impl LdapBackend {
    pub fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }
}

impl Backend for LdapBackend {
    fn open(&self) -> Result<Box<dyn Session>> {
        let url = self.config.url();
        log::debug!("connecting to directory at {url}");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.timeout_secs))
            .set_starttls(self.config.start_tls)
            .set_no_tls_verify(self.config.insecure_skip_verify);

        let mut conn = LdapConn::with_settings(settings, &url).map_err(|e| Error::Connect {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let bind_dn = &self.config.bind_dn;
        log::debug!("binding to directory as {bind_dn}");
        conn.simple_bind(bind_dn, &self.config.bind_password)
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| Error::Bind {
                dn: bind_dn.clone(),
                message: e.to_string(),
            })?;

        Ok(Box::new(LdapSession { conn }))
    }
}

struct LdapSession {
    conn: LdapConn,
}

impl Session for LdapSession {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<Entry>> {
        let filter = request.filter.to_string();
        log::trace!("searching {} for {}", request.base, filter);

        let (entries, _) = self
            .conn
            .search(&request.base, Scope::Subtree, &filter, request.attrs.clone())
            .and_then(ldap3::SearchResult::success)
            .map_err(|e| Error::Search {
                base: request.base.clone(),
                filter: filter.clone(),
                message: e.to_string(),
            })?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|e| Entry {
                dn: e.dn,
                attrs: e.attrs,
            })
            .collect())
    }

    fn is_closing(&mut self) -> bool {
        self.conn.is_closed()
    }
}
