//! Configuration for the lineage graph engine.

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Maximum number of frontier urns queried by a single batch.
    pub batch_size: usize,
    /// Page size of each batch search; the backing engine's maximum result
    /// window.
    pub max_result_window: usize,
    /// Wall-clock budget for an entire traversal. Hops that do not complete
    /// within the budget are abandoned and the results so far are returned.
    #[serde(with = "humantime_serde")]
    pub traversal_timeout: Duration,
    /// Logical-to-physical index naming.
    pub index: IndexConvention,
    /// Logging configuration.
    pub observability: ObservabilityConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_result_window: 10_000,
            traversal_timeout: Duration::from_secs(10),
            index: IndexConvention::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl GraphConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| GraphError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(GraphError::InvalidConfig {
                field: "batch_size".to_string(),
                reason: "Batch size must be non-zero".to_string(),
            });
        }

        if self.max_result_window == 0 {
            return Err(GraphError::InvalidConfig {
                field: "max_result_window".to_string(),
                reason: "Result window must be non-zero".to_string(),
            });
        }

        if self.traversal_timeout.is_zero() {
            return Err(GraphError::InvalidConfig {
                field: "traversal_timeout".to_string(),
                reason: "Traversal timeout must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Resolves logical index names to the physical names used by the cluster.
///
/// A shared cluster typically namespaces indices with a deployment prefix;
/// physical names are always lowercased.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConvention {
    /// Optional deployment prefix, e.g. `prod`.
    pub prefix: Option<String>,
}

impl IndexConvention {
    /// Convention with a deployment prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Physical name for a logical index.
    pub fn index_name(&self, base: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, base).to_lowercase(),
            None => base.to_lowercase(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON-formatted logs.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Serde helper for Duration using humantime format.
pub mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| e.to_string())
        } else if let Some(s_val) = s.strip_suffix('s') {
            s_val
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| e.to_string())
        } else if let Some(m) = s.strip_suffix('m') {
            m.parse::<u64>()
                .map(|v| Duration::from_secs(v * 60))
                .map_err(|e| e.to_string())
        } else {
            s.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GraphConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_result_window, 10_000);
        assert_eq!(config.traversal_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let config = GraphConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GraphError::InvalidConfig { field, .. }) if field == "batch_size"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = GraphConfig {
            traversal_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_parses_duration_string() {
        let json = r#"{
            "batch_size": 500,
            "max_result_window": 5000,
            "traversal_timeout": "10s",
            "index": {"prefix": "prod"},
            "observability": {"log_level": "debug", "json_logs": true}
        }"#;
        let config: GraphConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.traversal_timeout, Duration::from_secs(10));
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.index.index_name("graph_service_v1"), "prod_graph_service_v1");
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_config_accepts_all_duration_suffixes() {
        for (text, expected) in [
            ("500ms", Duration::from_millis(500)),
            ("2m", Duration::from_secs(120)),
            ("750", Duration::from_millis(750)),
        ] {
            let json = format!(
                r#"{{"batch_size": 1, "max_result_window": 1, "traversal_timeout": "{}",
                    "index": {{"prefix": null}},
                    "observability": {{"log_level": "info", "json_logs": false}}}}"#,
                text
            );
            let config: GraphConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(config.traversal_timeout, expected, "for input {}", text);
        }
    }

    #[test]
    fn test_duration_serializes_as_millisecond_string() {
        let value = serde_json::to_value(GraphConfig::default()).unwrap();
        assert_eq!(value["traversal_timeout"], serde_json::json!("10000ms"));
    }

    #[test]
    fn test_index_convention() {
        assert_eq!(IndexConvention::default().index_name("graph_service_v1"), "graph_service_v1");
        assert_eq!(
            IndexConvention::with_prefix("Prod").index_name("graph_service_v1"),
            "prod_graph_service_v1"
        );
    }
}
