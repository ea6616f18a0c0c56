mod cli;
mod commands;
mod config;
mod engine;
mod error;
mod paths;
mod platform;
mod resource;
mod session;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub dry_run: bool,
    pub config: Option<PathBuf>,
    pub token: Option<String>,
    pub uaa_token: Option<String>,
    pub ldap_password: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        dry_run: cli.dry_run,
        config: cli.config,
        token: cli.token,
        uaa_token: cli.uaa_token,
        ldap_password: cli.ldap_password,
    };

    match cli.command {
        Command::UpdateOrgUsers => commands::users::update_org_users(&ctx),
        Command::UpdateSpaceUsers => commands::users::update_space_users(&ctx),
        Command::CreateOrgs => commands::resources::create_orgs(&ctx),
        Command::CreateSpaces => commands::resources::create_spaces(&ctx),
        Command::UpdateSecurityGroups => commands::resources::update_security_groups(&ctx),
        Command::UpdateIsolationSegments => commands::resources::update_isolation_segments(&ctx),
        Command::UpdateSharedDomains => commands::resources::update_shared_domains(&ctx),
        Command::UpdateQuotas => commands::resources::update_quotas(&ctx),
        Command::Apply => commands::apply::run(&ctx),
        Command::Validate => commands::validate::run(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "orgsync", &mut io::stdout());
            Ok(())
        }
    }
}
