//! Configuration loading
//!
//! Layered sources: an optional file, then `VIGIL_*` environment
//! variables. Every key is optional; a missing file yields the documented
//! defaults.

use config::{Config, Environment, File};
use std::path::Path;
use vigil_types::VigilConfig;

use crate::error::VigilError;

/// Load configuration from an optional file plus the environment.
///
/// Environment keys use `__` as the section separator, so
/// `VIGIL_LABELS__TREAT_INJECTIONS_AS_REAL=true` overrides
/// `labels.treat_injections_as_real`.
pub fn load_config(path: Option<&Path>) -> Result<VigilConfig, VigilError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }
    let settings = builder
        .add_source(Environment::with_prefix("VIGIL").separator("__"))
        .build()?;
    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_no_file_yields_defaults() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.thresholds.default_rate_threshold, 1.0e-6);
        assert_eq!(cfg.labels.blocked_labels, vec!["DQV", "INJ"]);
        assert!(!cfg.signoff.require_operator);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[thresholds]\ndefault_rate_threshold = 1.0e-7").unwrap();
        writeln!(f, "[signoff]\nrequire_advocate = true").unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.thresholds.default_rate_threshold, 1.0e-7);
        assert!(cfg.signoff.require_advocate);
        // Untouched sections keep their defaults
        assert_eq!(cfg.joint_metric.default_threshold, 1.0e-3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config(Some(&path)).is_err());
    }
}
