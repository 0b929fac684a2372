// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Settings for one bridge instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Module name the scripting side binds to.
    pub module_name: String,
    /// Deepest nesting of arrays/objects accepted by the marshaling layer.
    pub max_depth: usize,
    /// Log (at debug) every event dropped because nobody is listening.
    pub log_dropped_events: bool,
    /// Minute interval used when `openPicker` omits `minuteInterval`.
    pub default_minute_interval: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module_name: "RNDatePicker".into(),
            max_depth: 64,
            log_dropped_events: true,
            default_minute_interval: 1,
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        debug!(path = %path.display(), module = %config.module_name, "loaded bridge config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json_str(r#"{ "max_depth": 8 }"#).unwrap();
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.module_name, "RNDatePicker");
        assert!(config.log_dropped_events);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = BridgeConfig::from_json_str("{ max_depth: ").unwrap_err();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "module_name": "DatePickerTest", "default_minute_interval": 15 }}"#)
            .unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.module_name, "DatePickerTest");
        assert_eq!(config.default_minute_interval, 15);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
