//! Site configuration types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Site settings keyed by name.
pub type ConfigMap = BTreeMap<String, String>;

/// A key-level change pushed by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConfigEvent {
    /// Key inserted or updated.
    Upsert {
        /// Setting name.
        key: String,
        /// New value.
        value: String,
    },
    /// Key removed.
    Delete {
        /// Setting name.
        key: String,
    },
}

impl ConfigEvent {
    /// The key this event touches.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Upsert { key, .. } | Self::Delete { key } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event: ConfigEvent =
            serde_json::from_str(r#"{"op":"upsert","key":"site_title","value":"Quill"}"#).unwrap();
        assert_eq!(
            event,
            ConfigEvent::Upsert {
                key: "site_title".into(),
                value: "Quill".into()
            }
        );

        let event: ConfigEvent = serde_json::from_str(r#"{"op":"delete","key":"banner"}"#).unwrap();
        assert_eq!(event.key(), "banner");
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        assert!(serde_json::from_str::<ConfigEvent>(r#"{"op":"truncate","key":"x"}"#).is_err());
    }
}
