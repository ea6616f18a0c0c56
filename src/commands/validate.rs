//! `validate`: parse and check the config without touching any service

use crate::Context;
use crate::config::Config;
use crate::paths;
use crate::ui;
use anyhow::Result;

pub fn run(ctx: &Context) -> Result<()> {
    let path = paths::config_file(ctx.config.as_deref())?;

    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            ui::error(&e.to_string());
            return Err(e.into());
        }
    };

    if !ctx.quiet {
        ui::header("Configuration");
        ui::kv("file", &path.display().to_string());
        ui::kv("orgs", &config.orgs.len().to_string());
        ui::kv(
            "spaces",
            &config
                .orgs
                .iter()
                .map(|o| o.spaces.len())
                .sum::<usize>()
                .to_string(),
        );
        ui::kv("security groups", &config.security_groups.len().to_string());
        ui::kv("quotas", &config.quotas.len().to_string());
        ui::section("Directory");
        if config.directory.enabled {
            ui::info(&format!(
                "{}:{} (origin {})",
                config.directory.host, config.directory.port, config.directory.origin
            ));
        } else {
            ui::dim("disabled");
        }
        println!();
        ui::success("Configuration is valid");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn context(config: &Path) -> Context {
        Context {
            quiet: true,
            dry_run: false,
            config: Some(config.to_path_buf()),
            token: None,
            uaa_token: None,
            ldap_password: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[[orgs]]\nname = \"acme\"\n").unwrap();
        assert!(run(&context(file.path())).is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[[orgs]]\nname = \"acme\"\n[[orgs]]\nname = \"acme\"\n")
            .unwrap();
        let err = run(&context(file.path())).unwrap_err();
        assert!(err.to_string().contains("duplicate org acme"));
    }
}
