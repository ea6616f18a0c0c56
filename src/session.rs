//! One reconciliation run
//!
//! The session owns every run-scoped cache (directory groups and users, the
//! identity account index) and the platform client. It is created once per
//! command and dropped at the end, so nothing survives between runs.

use crate::config::Config;
use crate::error::SyncError;
use crate::platform::Platform;
use crate::platform::http::CloudController;
use directory::Resolver;
use identity::Provisioner;
use reconcile::{ApplyContext, DRY_RUN_PREFIX};

pub struct Session {
    pub ctx: ApplyContext,
    pub platform: Box<dyn Platform>,
    /// `None` when the directory is disabled
    pub directory: Option<Resolver>,
    pub identity: Provisioner,
    /// Origin for accounts created from federated emails
    pub federated_origin: String,
}

impl Session {
    pub fn new(
        ctx: ApplyContext,
        platform: Box<dyn Platform>,
        directory: Option<Resolver>,
        identity: Provisioner,
        federated_origin: impl Into<String>,
    ) -> Self {
        Self {
            ctx,
            platform,
            directory,
            identity,
            federated_origin: federated_origin.into(),
        }
    }

    /// Session against the live services named in `config`
    pub fn connect(config: &Config, dry_run: bool) -> Result<Self, SyncError> {
        if config.platform.api_url.is_empty() {
            return Err(SyncError::Config("[platform] api_url is required".into()));
        }
        if config.platform.token.is_empty() {
            return Err(SyncError::Config(
                "platform token missing: set ORGSYNC_TOKEN or pass --token".into(),
            ));
        }

        let uaa_token = if config.identity.token.is_empty() {
            &config.platform.token
        } else {
            &config.identity.token
        };
        let uaa_url = if config.identity.uaa_url.is_empty() {
            derive_uaa_url(&config.platform.api_url)
        } else {
            config.identity.uaa_url.clone()
        };
        log::debug!("platform {} identity {}", config.platform.api_url, uaa_url);

        let directory = config
            .directory
            .enabled
            .then(|| Resolver::new(config.directory.clone()));

        Ok(Self::new(
            ApplyContext::new(dry_run),
            Box::new(CloudController::new(
                &config.platform.api_url,
                &config.platform.token,
            )),
            directory,
            Provisioner::new(&uaa_url, uaa_token),
            &config.federation.origin,
        ))
    }

    /// A configured item the platform does not have yet.
    ///
    /// Under dry-run it may be one the same preview would have created, so
    /// it is only noted; a live run fails and names the command to run first.
    pub fn missing(&self, what: &str, command: &str) -> Result<(), SyncError> {
        if self.ctx.dry_run {
            log::info!("{DRY_RUN_PREFIX}{what} does not exist yet, skipping");
            Ok(())
        } else {
            Err(SyncError::Config(format!(
                "{what} does not exist; run {command} first"
            )))
        }
    }

    /// Context for a resource kind whose extras may be deleted when `cleanup` is set
    pub fn ctx_with_cleanup(&self, cleanup: bool) -> ApplyContext {
        self.ctx.with_cleanup(cleanup)
    }
}

/// `https://api.sys.example.com` -> `https://uaa.sys.example.com`
fn derive_uaa_url(api_url: &str) -> String {
    let url = api_url.trim_end_matches('/');
    match url.split_once("://api.") {
        Some((scheme, rest)) => format!("{scheme}://uaa.{rest}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_uaa_url() {
        assert_eq!(
            derive_uaa_url("https://api.sys.example.com/"),
            "https://uaa.sys.example.com"
        );
        assert_eq!(derive_uaa_url("http://localhost:9022"), "http://localhost:9022");
    }

    #[test]
    fn test_connect_requires_api_url_and_token() {
        let mut config = Config::default();
        assert!(matches!(
            Session::connect(&config, true),
            Err(SyncError::Config(_))
        ));

        config.platform.api_url = "https://api.example.com".into();
        let err = Session::connect(&config, true).err().unwrap();
        assert!(err.to_string().contains("ORGSYNC_TOKEN"));

        config.platform.token = "t".into();
        let session = Session::connect(&config, true).unwrap();
        assert!(session.ctx.dry_run);
        assert!(session.directory.is_none());
        assert_eq!(session.federated_origin, "saml");
    }
}
