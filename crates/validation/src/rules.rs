//! Built-in validation rules over generic field values

use serde_json::Value;

use crate::error::ValidationError;

/// A single validation rule applied to one field value
pub trait ValidationRule: Send + Sync {
    /// Check a field value, returning the failure if the rule is violated
    fn check(&self, field: &str, value: &Value) -> Result<(), ValidationError>;

    /// Rule name used in error codes
    fn rule_name(&self) -> &'static str;
}

/// Requires a field to be present and non-null (empty strings also fail)
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredRule;

impl ValidationRule for RequiredRule {
    fn check(&self, field: &str, value: &Value) -> Result<(), ValidationError> {
        let missing = match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if missing {
            return Err(ValidationError::with_code(
                field,
                "This field is required",
                self.rule_name(),
            ));
        }
        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "required"
    }
}

/// Bounds the length of string values; null values pass (combine with
/// `RequiredRule` when presence is also mandatory)
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthRule {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl LengthRule {
    /// Require at least `min` characters
    pub fn min(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Allow at most `max` characters
    pub fn max(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Require a length within `[min, max]`
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl ValidationRule for LengthRule {
    fn check(&self, field: &str, value: &Value) -> Result<(), ValidationError> {
        let Some(text) = value.as_str() else {
            return Ok(());
        };
        let length = text.chars().count();

        if let Some(min) = self.min {
            if length < min {
                return Err(ValidationError::with_code(
                    field,
                    format!("Must be at least {} characters", min),
                    self.rule_name(),
                ));
            }
        }
        if let Some(max) = self.max {
            if length > max {
                return Err(ValidationError::with_code(
                    field,
                    format!("Must be at most {} characters", max),
                    self.rule_name(),
                ));
            }
        }
        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }
}

/// Bounds numeric values; non-numeric values pass
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RangeRule {
    /// Require a value of at least `min`
    pub fn min(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Allow a value of at most `max`
    pub fn max(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Require a value within `[min, max]`
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl ValidationRule for RangeRule {
    fn check(&self, field: &str, value: &Value) -> Result<(), ValidationError> {
        let Some(number) = value.as_f64() else {
            return Ok(());
        };

        if let Some(min) = self.min {
            if number < min {
                return Err(ValidationError::with_code(
                    field,
                    format!("Must be at least {}", min),
                    self.rule_name(),
                ));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Err(ValidationError::with_code(
                    field,
                    format!("Must be at most {}", max),
                    self.rule_name(),
                ));
            }
        }
        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "range"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_rule() {
        let rule = RequiredRule;
        assert!(rule.check("name", &json!("Ada")).is_ok());
        assert!(rule.check("name", &json!(0)).is_ok());
        assert!(rule.check("name", &Value::Null).is_err());
        assert!(rule.check("name", &json!("   ")).is_err());
    }

    #[test]
    fn test_length_rule() {
        let rule = LengthRule::between(2, 5);
        assert!(rule.check("code", &json!("abc")).is_ok());
        assert!(rule.check("code", &json!("a")).is_err());
        assert!(rule.check("code", &json!("abcdef")).is_err());
        // non-strings pass
        assert!(rule.check("code", &json!(123456)).is_ok());
        assert!(rule.check("code", &Value::Null).is_ok());
    }

    #[test]
    fn test_range_rule() {
        let rule = RangeRule::between(1.0, 10.0);
        assert!(rule.check("quantity", &json!(5)).is_ok());
        assert!(rule.check("quantity", &json!(0)).is_err());
        assert!(rule.check("quantity", &json!(11)).is_err());
        assert!(rule.check("quantity", &json!("text")).is_ok());
    }
}
