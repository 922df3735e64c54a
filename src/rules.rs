//! Masking rule set
//!
//! A rule set maps field categories (`emailFields`, `passwordFields`, ...)
//! to the field paths that belong to them. The pipeline treats it as an
//! opaque value and hands it to the masker verbatim; only the masker decides
//! what a key means or whether it is valid.
//!
//! Keys use camelCase so existing JSON rule files load unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Category key for email-like fields
pub const EMAIL_FIELDS: &str = "emailFields";
/// Category key for password-like fields
pub const PASSWORD_FIELDS: &str = "passwordFields";
/// Category key for phone numbers
pub const PHONE_FIELDS: &str = "phoneFields";
/// Category key for payment card numbers
pub const CARD_FIELDS: &str = "cardFields";
/// Category key for UUIDs
pub const UUID_FIELDS: &str = "uuidFields";
/// Category key for JSON web tokens
pub const JWT_FIELDS: &str = "jwtFields";
/// Category key for free-form strings
pub const STRING_FIELDS: &str = "stringFields";

/// Immutable rule set supplied once per pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskingRules {
    entries: BTreeMap<String, Value>,
}

impl MaskingRules {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field list under a category key (e.g. `emailFields`)
    pub fn with_fields<I, S>(mut self, category: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|f| Value::String(f.into()))
            .collect::<Vec<_>>();
        self.entries.insert(category.into(), Value::Array(fields));
        self
    }

    /// Add an options object under a key (e.g. `emailMaskOptions`)
    pub fn with_options(mut self, key: impl Into<String>, options: Value) -> Self {
        self.entries.insert(key.into(), options);
        self
    }

    /// Look up a raw entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, Value>> for MaskingRules {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let rules = MaskingRules::new()
            .with_fields(EMAIL_FIELDS, ["email"])
            .with_fields(PASSWORD_FIELDS, vec!["password".to_string()]);

        assert_eq!(rules.iter().count(), 2);
        assert_eq!(rules.get(EMAIL_FIELDS), Some(&serde_json::json!(["email"])));
        assert_eq!(
            rules.get(PASSWORD_FIELDS),
            Some(&serde_json::json!(["password"]))
        );
        assert!(rules.get(PHONE_FIELDS).is_none());
    }

    #[test]
    fn test_deserialize_flat_map() {
        let rules: MaskingRules = serde_json::from_value(serde_json::json!({
            "emailFields": ["email"],
            "passwordFields": ["password"],
            "emailMaskOptions": {"unmaskedStartCharactersBeforeAt": 1}
        }))
        .unwrap();

        assert_eq!(rules.iter().count(), 3);
        let keys: Vec<&str> = rules.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["emailFields", "emailMaskOptions", "passwordFields"]);
    }

    #[test]
    fn test_unknown_keys_are_kept_verbatim() {
        let rules: MaskingRules =
            serde_json::from_value(serde_json::json!({"ssnFields": 42})).unwrap();
        assert_eq!(rules.get("ssnFields"), Some(&serde_json::json!(42)));

        let back = serde_json::to_value(&rules).unwrap();
        assert_eq!(back, serde_json::json!({"ssnFields": 42}));
    }

    #[test]
    fn test_empty() {
        let rules = MaskingRules::default();
        assert_eq!(rules.iter().count(), 0);
    }
}
