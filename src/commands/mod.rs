pub mod init_config;
pub mod report;
pub mod tables;

use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::constants::DEFAULT_CONFIG_FILE;
use crate::error::{Error, Result};
use crate::models::ReportConfig;

/// Load the configuration named on the command line, or `portfolio.json`
/// with a fallback to the built-in defaults when no path was given.
fn load_config(path: Option<PathBuf>) -> Result<ReportConfig> {
    match path {
        Some(path) => ReportConfig::load(&path, true),
        None => ReportConfig::load(&PathBuf::from(DEFAULT_CONFIG_FILE), false),
    }
}

/// The pipeline is sequential, so a current-thread runtime is enough
fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_explicit_missing() {
        let dir = TempDir::new().unwrap();
        let result = load_config(Some(dir.path().join("missing.json")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_config_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(
            &path,
            r#"{"holdings": [{"ticker": "VCB", "sector": "Banking"}], "highlighted_ticker": "VCB", "provider": "vci"}"#,
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.tickers(), vec!["VCB"]);
        assert_eq!(config.provider.name(), "vci");
    }

    #[test]
    fn test_build_runtime() {
        let runtime = build_runtime().unwrap();
        let value = runtime.block_on(async { 21 * 2 });
        assert_eq!(value, 42);
    }
}
