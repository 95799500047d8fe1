//! Agent configuration loader.
//! Reads modulyx.toml from the current directory or the path in MODULYX_CONFIG.

use std::path::Path;

use modulyx_common::config::PipelineConfig;

pub const CONFIG_ENV: &str = "MODULYX_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "modulyx.toml";

/// Resolve the configuration path: MODULYX_CONFIG first, then ./modulyx.toml.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
}

/// Load and validate the pipeline configuration.
pub fn load() -> anyhow::Result<PipelineConfig> {
    load_from(config_path())
}

pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<PipelineConfig> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    Ok(PipelineConfig::from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_load_toml_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modulyx.toml");
        std::fs::write(
            &path,
            "[network]\nconfidence = 0.7\nexcluded_channels = [\"textmining\"]\n\n[enrichment]\ntop_k = 5\n",
        )
        .unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config.network.confidence, 0.7);
        assert_eq!(config.enrichment.top_k, 5);
        assert_eq!(config.clustering.inflation, 2.0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modulyx.toml");
        std::fs::write(&path, "[network]\nconfidence = 1.5\n").unwrap();
        assert!(load_from(&path).is_err());
    }
}
