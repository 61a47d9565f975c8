//! Records engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                  | Default      | Meaning                        |
//! |---------------------------|--------------|--------------------------------|
//! | `RECORDS_DATABASE_PATH`   | `records.db` | SQLite file                    |
//! | `RECORDS_MAX_CONNECTIONS` | `5`          | Pool size                      |
//! | `RECORDS_GRADE_SCALE`     | A70..E40     | JSON array of grade bands      |
//!
//! Grade band `min_score` values are hundredths of a mark, so a band starting
//! at 70 marks is written `{"min_score": 7000, "letter": "A"}`. Bounds between
//! 0 and 100 (a table written in whole marks) are rejected at load time.

use records_core::GradeScale;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::pool::DbConfig;

/// Environment variable names.
pub const ENV_DATABASE_PATH: &str = "RECORDS_DATABASE_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "RECORDS_MAX_CONNECTIONS";
pub const ENV_GRADE_SCALE: &str = "RECORDS_GRADE_SCALE";

/// Records engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Maximum pool connections
    pub max_connections: u32,

    /// Grade band table used when grading submitted scores
    pub grade_scale: GradeScale,
}

impl RecordsConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (the environment in `load`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = RecordsConfig {
            database_path: lookup(ENV_DATABASE_PATH)
                .unwrap_or_else(|| "records.db".to_string())
                .into(),

            max_connections: lookup(ENV_MAX_CONNECTIONS)
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()))?,

            grade_scale: match lookup(ENV_GRADE_SCALE) {
                Some(json) => GradeScale::from_json(&json).map_err(|e| {
                    ConfigError::InvalidGradeScale(format!("{ENV_GRADE_SCALE}: {e}"))
                })?,
                None => GradeScale::default(),
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
        }

        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired(ENV_DATABASE_PATH.to_string()));
        }

        Ok(config)
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .grade_scale(self.grade_scale.clone())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid grade scale: {0}")]
    InvalidGradeScale(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use records_core::{GradeLetter, Score};
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RecordsConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("records.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.grade_scale, GradeScale::default());
    }

    #[test]
    fn test_custom_values() {
        let config = RecordsConfig::from_lookup(lookup(&[
            (ENV_DATABASE_PATH, "/tmp/campus.db"),
            (ENV_MAX_CONNECTIONS, "8"),
            (
                ENV_GRADE_SCALE,
                r#"[{"min_score": 7500, "letter": "A"}, {"min_score": 5000, "letter": "C"}]"#,
            ),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 8);
        let grade = config.grade_scale.grade_for(Score::from_whole(72));
        assert_eq!(grade.letter, GradeLetter::C);

        let db = config.db_config();
        assert_eq!(db.max_connections, 8);
        assert_eq!(db.database_path, PathBuf::from("/tmp/campus.db"));
    }

    #[test]
    fn test_invalid_values() {
        let err = RecordsConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = RecordsConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        // Ascending bounds are rejected.
        let err = RecordsConfig::from_lookup(lookup(&[(
            ENV_GRADE_SCALE,
            r#"[{"min_score": 4000, "letter": "E"}, {"min_score": 7000, "letter": "A"}]"#,
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGradeScale(_)));
    }

    #[test]
    fn test_grade_scale_in_whole_marks_is_rejected() {
        let err = RecordsConfig::from_lookup(lookup(&[(
            ENV_GRADE_SCALE,
            r#"[{"min_score": 70, "letter": "A"}, {"min_score": 40, "letter": "E"}]"#,
        )]))
        .unwrap_err();
        match err {
            ConfigError::InvalidGradeScale(msg) => {
                assert!(msg.contains(ENV_GRADE_SCALE), "{msg}");
                assert!(msg.contains("hundredths"), "{msg}");
            }
            other => panic!("expected InvalidGradeScale, got {other:?}"),
        }
    }
}
