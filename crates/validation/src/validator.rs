//! Entity validator combining per-field rules
//!
//! Rules run against an entity's generic field map. Every rule on every
//! field is evaluated before the validator returns, so the caller receives
//! the complete set of failures rather than the first one.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ValidationErrors, ValidationResult};
use crate::rules::ValidationRule;

/// Trait for types that validate an entity's field map
pub trait ValidateFields: Send + Sync {
    /// Validate the full field map, collecting every failure
    fn validate_fields(&self, fields: &Map<String, Value>) -> ValidationResult<()>;
}

/// Rule-driven validator for one entity type
#[derive(Clone, Default)]
pub struct EntityValidator {
    rules: HashMap<String, Vec<Arc<dyn ValidationRule>>>,
}

impl EntityValidator {
    /// Create a validator with no rules (always passes)
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a rule to a field
    pub fn rule(mut self, field: impl Into<String>, rule: impl ValidationRule + 'static) -> Self {
        self.rules.entry(field.into()).or_default().push(Arc::new(rule));
        self
    }

    /// Number of fields with rules attached
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(|v| v.len()).sum()
    }
}

impl ValidateFields for EntityValidator {
    fn validate_fields(&self, fields: &Map<String, Value>) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();

        for (field, rules) in &self.rules {
            let value = fields.get(field.as_str()).unwrap_or(&Value::Null);
            for rule in rules {
                if let Err(error) = rule.check(field, value) {
                    errors.add(error);
                }
            }
        }

        errors.into_result()
    }
}

impl std::fmt::Debug for EntityValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityValidator")
            .field("fields", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{LengthRule, RangeRule, RequiredRule};
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_passing_entity() {
        let validator = EntityValidator::new()
            .rule("name", RequiredRule)
            .rule("name", LengthRule::max(32))
            .rule("quantity", RangeRule::min(1.0));

        let result = validator.validate_fields(&fields(&[
            ("name", json!("Widget")),
            ("quantity", json!(3)),
        ]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_all_failures_collected() {
        let validator = EntityValidator::new()
            .rule("name", RequiredRule)
            .rule("name", LengthRule::min(2))
            .rule("quantity", RangeRule::min(1.0));

        let result = validator.validate_fields(&fields(&[
            ("name", Value::Null),
            ("quantity", json!(0)),
        ]));

        let errors = result.unwrap_err();
        // exhaustive collection: both fields reported in one pass
        assert!(errors.has_field_errors("name"));
        assert!(errors.has_field_errors("quantity"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_missing_field_treated_as_null() {
        let validator = EntityValidator::new().rule("name", RequiredRule);
        let result = validator.validate_fields(&Map::new());
        assert!(result.unwrap_err().has_field_errors("name"));
    }
}
