use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModulyxError {
    /// Caller supplied unusable input (no genes, parameter out of range).
    #[error("Input error: {0}")]
    Input(String),

    /// The upstream retrieval service failed or returned malformed data.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ModulyxError>;

/// Reject a probability-like parameter outside `[0, 1)`.
pub fn validate_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..1.0).contains(&value) {
        return Err(ModulyxError::Input(format!(
            "{name} must lie in [0, 1), got {value}"
        )));
    }
    Ok(())
}

/// Reject an FDR threshold outside `(0, 1]`.
pub fn validate_fdr_threshold(value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ModulyxError::Input(format!(
            "fdr threshold must lie in (0, 1], got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_interval_bounds() {
        assert!(validate_unit_interval("prior", 0.0).is_ok());
        assert!(validate_unit_interval("prior", 0.041).is_ok());
        assert!(validate_unit_interval("prior", 1.0).is_err());
        assert!(validate_unit_interval("prior", -0.1).is_err());
        assert!(validate_unit_interval("prior", f64::NAN).is_err());
    }

    #[test]
    fn test_fdr_threshold_bounds() {
        assert!(validate_fdr_threshold(0.05).is_ok());
        assert!(validate_fdr_threshold(1.0).is_ok());
        assert!(validate_fdr_threshold(0.0).is_err());
    }
}
