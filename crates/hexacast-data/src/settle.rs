//! Loads [`SettleConfig`] from a data directory.

use std::path::Path;

use hexacast_core::config::SettleConfig;

use crate::loader::{DataLoadError, deserialize_file, find_data_file};

/// Base name of the settle file: `settle.ron`, `settle.toml` or `settle.json`.
pub const SETTLE_BASE_NAME: &str = "settle";

/// Load the settle config from `dir`. Missing fields take their defaults,
/// and so does a missing file. The result is validated.
pub fn load_settle_config(dir: &Path) -> Result<SettleConfig, DataLoadError> {
    match find_data_file(dir, SETTLE_BASE_NAME)? {
        Some(path) => load_settle_config_file(&path),
        None => {
            tracing::debug!(dir = %dir.display(), "no settle file, using defaults");
            Ok(SettleConfig::default())
        }
    }
}

/// Load and validate one settle file.
pub fn load_settle_config_file(path: &Path) -> Result<SettleConfig, DataLoadError> {
    let config: SettleConfig = deserialize_file(path)?;
    config
        .validate()
        .map_err(|source| DataLoadError::Invalid {
            file: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(
        file = %path.display(),
        grace_ms = config.grace_ms,
        max_wait_ms = config.max_wait_ms,
        "settle config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{cleanup, make_test_dir};
    use hexacast_core::config::ConfigError;
    use std::fs;

    #[test]
    fn absent_file_gives_defaults() {
        let dir = make_test_dir("settle_absent");
        assert_eq!(load_settle_config(&dir).unwrap(), SettleConfig::default());
        cleanup(&dir);
    }

    #[test]
    fn partial_ron_keeps_other_defaults() {
        let dir = make_test_dir("settle_partial");
        fs::write(dir.join("settle.ron"), "(grace_ms: 400, seed: Some(7))").unwrap();

        let config = load_settle_config(&dir).unwrap();
        assert_eq!(config.grace_ms, 400);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_wait_ms, SettleConfig::default().max_wait_ms);

        cleanup(&dir);
    }

    #[test]
    fn toml_with_nested_impulse() {
        let dir = make_test_dir("settle_toml");
        fs::write(
            dir.join("settle.toml"),
            "max_wait_ms = 5000\n\n[impulse]\nmin_lift = 2.0\nmax_lift = 3.0\n",
        )
        .unwrap();

        let config = load_settle_config(&dir).unwrap();
        assert_eq!(config.max_wait_ms, 5000);
        assert_eq!(config.impulse.min_lift, 2.0);
        assert_eq!(config.impulse.max_lift, 3.0);

        cleanup(&dir);
    }

    #[test]
    fn json_axes() {
        let dir = make_test_dir("settle_json");
        fs::write(
            dir.join("settle.json"),
            r#"{"marked_axis": [0.0, 0.0, 1.0], "world_up": [0.0, 0.0, 1.0]}"#,
        )
        .unwrap();

        let config = load_settle_config(&dir).unwrap();
        assert_eq!(config.marked_axis.z, 1.0);
        assert_eq!(config.world_up.z, 1.0);

        cleanup(&dir);
    }

    #[test]
    fn invalid_values_rejected() {
        let dir = make_test_dir("settle_invalid");
        fs::write(dir.join("settle.ron"), "(grace_ms: 9000, max_wait_ms: 1000)").unwrap();

        let err = load_settle_config(&dir).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Invalid {
                source: ConfigError::GraceNotBelowMaxWait { .. },
                ..
            }
        ));

        cleanup(&dir);
    }

    #[test]
    fn parse_errors_propagate() {
        let dir = make_test_dir("settle_parse");
        fs::write(dir.join("settle.json"), r#"{"grace_ms": "soon"}"#).unwrap();
        assert!(matches!(
            load_settle_config(&dir),
            Err(DataLoadError::Parse { .. })
        ));
        cleanup(&dir);
    }
}
