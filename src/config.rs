/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. TOML file: bench-analyzer.toml (in working directory)
/// 3. Environment variables: prefixed BENCH_ANALYZER_ (e.g., BENCH_ANALYZER_LOG_LEVEL=debug)
///
/// CLI flags are applied on top by the binary.

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Toml, Serialized},
};
use serde::{Deserialize, Serialize};
use crate::errors::AnalysisError;

pub const CONFIG_FILE: &str = "bench-analyzer.toml";
pub const ENV_PREFIX: &str = "BENCH_ANALYZER_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional file path for log output (in addition to stderr)
    #[serde(default)]
    pub log_file: Option<String>,

    /// Directory scanned for result files when no explicit input is given
    #[serde(default = "default_search_dir")]
    pub search_dir: PathBuf,

    /// Glob pattern (relative to search_dir) for result files
    #[serde(default = "default_input_pattern")]
    pub input_pattern: String,

    /// Explicit input CSV. Skips discovery when set.
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Where the report, charts and derived tables are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_search_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_input_pattern() -> String {
    "final_chase_rewriting_*.csv".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            log_file: None,
            search_dir: default_search_dir(),
            input_pattern: default_input_pattern(),
            input: None,
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML file, and environment variables
    ///
    /// Environment variables override TOML file values.
    /// Example: BENCH_ANALYZER_OUTPUT_DIR=out overrides output_dir in bench-analyzer.toml
    pub fn load() -> Result<Config, AnalysisError> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    fn from_figment(figment: Figment) -> Result<Config, AnalysisError> {
        figment
            .extract()
            .map_err(|e| AnalysisError::Config(format!("Failed to load config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, None);
        assert_eq!(config.input_pattern, "final_chase_rewriting_*.csv");
        assert_eq!(config.search_dir, PathBuf::from("."));
        assert!(config.input.is_none());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                log_level = "debug"
                output_dir = "out"
                input = "results.csv"
                "#,
            ));
        let config = Config::from_figment(figment).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.input, Some(PathBuf::from("results.csv")));
        assert_eq!(config.input_pattern, "final_chase_rewriting_*.csv");
    }

    #[test]
    fn test_bad_type_is_config_error() {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("log_level = [\"debug\"]"));
        let err = Config::from_figment(figment).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }
}
