//! Static per-layer configuration.
//!
//! Which tables feed the `/api/states` union, and which column each layer
//! is date-filtered on. Adding a spatial table to either list is a config
//! change, not a code change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::is_safe_identifier;

use super::errors::{ConfigError, ConfigResult};

/// Attributes of one configured layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerAttributes {
    /// Column used by `/api/filter/{table}`; layers without one cannot be
    /// date-filtered.
    #[serde(default)]
    pub date_column: Option<String>,

    /// Whether the layer's `state` values feed `/api/states` (default: true)
    #[serde(default = "default_state_source")]
    pub state_source: bool,
}

fn default_state_source() -> bool {
    true
}

impl LayerAttributes {
    pub fn dated(date_column: &str) -> Self {
        Self {
            date_column: Some(date_column.to_string()),
            state_source: true,
        }
    }
}

/// Table name → attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerRegistry {
    layers: BTreeMap<String, LayerAttributes>,
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::empty()
            .with_layer("neinput", LayerAttributes::dated("inputdate"))
            .with_layer("jkinput", LayerAttributes::dated("inputdate"))
            .with_layer("lweinput", LayerAttributes::dated("inputdate"))
            .with_layer("uavintercept", LayerAttributes::dated("missiondate"))
            .with_layer("crpfdeployment", LayerAttributes::dated("inputdate"))
            .with_layer("crpfincident", LayerAttributes::dated("inputdate"))
    }
}

impl LayerRegistry {
    pub fn empty() -> Self {
        Self {
            layers: BTreeMap::new(),
        }
    }

    pub fn with_layer(mut self, name: &str, attributes: LayerAttributes) -> Self {
        self.layers.insert(name.to_string(), attributes);
        self
    }

    pub fn get(&self, table: &str) -> Option<&LayerAttributes> {
        self.layers.get(table)
    }

    /// Date column configured for `table`, if any.
    pub fn date_column(&self, table: &str) -> Option<&str> {
        self.layers
            .get(table)
            .and_then(|attributes| attributes.date_column.as_deref())
    }

    /// Tables unioned by `/api/states`, in name order.
    pub fn state_sources(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|(_, attributes)| attributes.state_source)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Every name that may end up quoted into SQL must be a safe identifier.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, attributes) in &self.layers {
            if !is_safe_identifier(name) {
                return Err(ConfigError::invalid(format!("Invalid layer name: '{}'", name)));
            }
            if let Some(column) = &attributes.date_column {
                if !is_safe_identifier(column) {
                    return Err(ConfigError::invalid(format!(
                        "Invalid date column '{}' for layer '{}'",
                        column, name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = LayerRegistry::default();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.date_column("neinput"), Some("inputdate"));
        assert_eq!(registry.date_column("uavintercept"), Some("missiondate"));
        assert_eq!(registry.date_column("roads"), None);
        assert_eq!(registry.state_sources().len(), 6);
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let registry: LayerRegistry = serde_json::from_str(
            r#"{
                "rivers": {},
                "floods": { "date_column": "observed_on", "state_source": false }
            }"#,
        )
        .unwrap();

        assert_eq!(registry.date_column("rivers"), None);
        assert_eq!(registry.date_column("floods"), Some("observed_on"));
        assert_eq!(registry.state_sources(), vec!["rivers"]);
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let registry = LayerRegistry::empty().with_layer("roads;--", LayerAttributes::dated("day"));
        assert!(registry.validate().is_err());

        let registry = LayerRegistry::empty().with_layer("roads", LayerAttributes::dated("day\""));
        assert!(registry.validate().is_err());
    }
}
