//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: &Settings, path: Option<&str>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", settings.to_toml()?);
        }

        ConfigAction::Path => {
            println!("{}", config_path(path).display());
        }

        ConfigAction::Init { force } => {
            let target = config_path(path);
            if let Err(e) = Settings::write_default(&target, *force) {
                Output::error(&format!("{}", e));
                return Err(e.into());
            }
            Output::success(&format!("Wrote default config to {}", target.display()));
        }
    }

    Ok(())
}

/// The file named by `--config`, or the standard location.
fn config_path(path: Option<&str>) -> PathBuf {
    path.map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_then_refuses_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("wikivox").join("config.toml");
        let path = target.to_str().unwrap();
        let settings = Settings::default();

        run_config(&ConfigAction::Init { force: false }, &settings, Some(path)).unwrap();
        assert!(target.exists());

        assert!(run_config(&ConfigAction::Init { force: false }, &settings, Some(path)).is_err());
        run_config(&ConfigAction::Init { force: true }, &settings, Some(path)).unwrap();
    }
}
