use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_CONFIG_FILE;
use crate::error::{Error, Result};
use crate::models::ReportConfig;

pub fn run(path: Option<PathBuf>, force: bool) {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match write_default_config(&path, force) {
        Ok(()) => {
            println!("✅ Default configuration written to {}", path.display());
            println!("💡 Edit holdings and sectors, then run 'portfolio-report report'");
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

/// Write the built-in configuration to `path`, refusing to overwrite
/// an existing file unless `force` is set
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists, use --force to overwrite",
            path.display()
        )));
    }

    ReportConfig::default().save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_default_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("portfolio.json");

        write_default_config(&path, false).unwrap();
        let loaded = ReportConfig::from_file(&path).unwrap();
        assert_eq!(loaded, ReportConfig::default());
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("portfolio.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(matches!(write_default_config(&path, false), Err(Error::Config(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        write_default_config(&path, true).unwrap();
        assert!(ReportConfig::from_file(&path).is_ok());
    }
}
