use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "orgsync")]
#[command(version)]
#[command(
    about = "Converge platform orgs, spaces and role memberships to a declared configuration",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/orgsync/orgsync.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every change instead of making it
    #[arg(long, visible_alias = "peek", global = true)]
    pub dry_run: bool,

    /// Platform API bearer token
    #[arg(long, env = "ORGSYNC_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Identity service token (default: the platform token)
    #[arg(long, env = "ORGSYNC_UAA_TOKEN", hide_env_values = true, global = true)]
    pub uaa_token: Option<String>,

    /// Directory bind password
    #[arg(
        long,
        env = "ORGSYNC_LDAP_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub ldap_password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sync org managers, auditors and billing managers
    UpdateOrgUsers,

    /// Sync space developers, managers and auditors
    UpdateSpaceUsers,

    /// Create configured orgs, delete unlisted ones when cleanup is on
    CreateOrgs,

    /// Create configured spaces, delete unlisted ones when cleanup is on
    CreateSpaces,

    /// Converge application security groups
    UpdateSecurityGroups,

    /// Converge isolation segments
    UpdateIsolationSegments,

    /// Converge shared domains
    UpdateSharedDomains,

    /// Create and update org quotas
    UpdateQuotas,

    /// Run every step in dependency order
    Apply,

    /// Load and validate the config file without contacting any service
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "orgsync",
            "update-space-users",
            "--peek",
            "-vv",
            "--config",
            "/tmp/orgsync.toml",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/orgsync.toml")));
        assert!(matches!(cli.command, Command::UpdateSpaceUsers));
    }
}
