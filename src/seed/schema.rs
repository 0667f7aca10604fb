//! JSON schema subset
//!
//! Supports the keywords the seed node schema uses: `type`, `required`,
//! `properties`, `additionalProperties`, `items`, `minItems`, `maxItems`,
//! `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum`,
//! `minLength`, `maxLength`, `pattern`, `enum`, `const` and `uniqueItems`.
//! A schema using any other assertion or applicator keyword is rejected
//! as a whole; `$schema`, `title`, `description`, `format` and the like
//! stay annotations.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;

use crate::models::errors::{AppError, AppResult, ErrorCode};

const TYPE_NAMES: &[&str] = &[
    "object", "array", "string", "number", "integer", "boolean", "null",
];

/// Keywords that constrain instances but are not enforced here
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "$ref", "$dynamicRef", "allOf", "anyOf", "oneOf", "not", "if", "then", "else",
    "dependentRequired", "dependentSchemas", "prefixItems", "contains", "minContains",
    "maxContains", "patternProperties", "propertyNames", "minProperties", "maxProperties",
    "multipleOf", "unevaluatedItems", "unevaluatedProperties",
];

/// A failed instance check
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Path from the document root to the offending value
    pub path: Vec<String>,
    pub message: String,
    pub instance: Value,
}

impl Violation {
    pub fn path_str(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(" -> ")
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (path: {}, value: {})", self.message, self.path_str(), self.instance)
    }
}

impl From<Violation> for AppError {
    fn from(v: Violation) -> Self {
        AppError::new(ErrorCode::SeedValidationFailed, v.to_string())
    }
}

// ============================================
// SCHEMA SHAPE
// ============================================

fn schema_error(location: &str, msg: impl fmt::Display) -> AppError {
    AppError::schema_invalid(format!("{}: {}", location, msg))
}

fn expect_count(schema: &Map<String, Value>, key: &str, location: &str) -> AppResult<()> {
    match schema.get(key) {
        Some(v) if !v.is_u64() => Err(schema_error(location, format!("`{}` must be a non-negative integer", key))),
        _ => Ok(()),
    }
}

/// Check that a schema document is well formed for the supported keywords
pub fn check_schema(schema: &Value) -> AppResult<()> {
    check_schema_at(schema, "#")
}

fn check_schema_at(schema: &Value, location: &str) -> AppResult<()> {
    let schema = match schema {
        Value::Bool(_) => return Ok(()),
        Value::Object(map) => map,
        other => return Err(schema_error(location, format!("schema must be an object, got {}", other))),
    };

    if let Some(keyword) = UNSUPPORTED_KEYWORDS.iter().find(|k| schema.contains_key(**k)) {
        return Err(schema_error(location, format!("keyword `{}` is not supported", keyword)));
    }

    if let Some(ty) = schema.get("type") {
        let names: Vec<&Value> = match ty {
            Value::Array(list) => list.iter().collect(),
            single => vec![single],
        };
        for name in names {
            match name.as_str() {
                Some(n) if TYPE_NAMES.contains(&n) => {}
                _ => return Err(schema_error(location, format!("unknown type {}", name))),
            }
        }
    }

    if let Some(required) = schema.get("required") {
        let valid = required
            .as_array()
            .is_some_and(|list| list.iter().all(Value::is_string));
        if !valid {
            return Err(schema_error(location, "`required` must be an array of strings"));
        }
    }

    if let Some(properties) = schema.get("properties") {
        let properties = properties
            .as_object()
            .ok_or_else(|| schema_error(location, "`properties` must be an object"))?;
        for (name, sub) in properties {
            check_schema_at(sub, &format!("{}/properties/{}", location, name))?;
        }
    }

    if let Some(additional) = schema.get("additionalProperties") {
        check_schema_at(additional, &format!("{}/additionalProperties", location))?;
    }
    if let Some(items) = schema.get("items") {
        check_schema_at(items, &format!("{}/items", location))?;
    }

    for key in ["minItems", "maxItems", "minLength", "maxLength"] {
        expect_count(schema, key, location)?;
    }
    for key in ["minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum"] {
        if schema.get(key).is_some_and(|v| !v.is_number()) {
            return Err(schema_error(location, format!("`{}` must be a number", key)));
        }
    }

    if let Some(pattern) = schema.get("pattern") {
        let pattern = pattern
            .as_str()
            .ok_or_else(|| schema_error(location, "`pattern` must be a string"))?;
        Regex::new(pattern).map_err(|e| schema_error(location, e))?;
    }

    if schema.get("enum").is_some_and(|v| !v.is_array()) {
        return Err(schema_error(location, "`enum` must be an array"));
    }
    if schema.get("uniqueItems").is_some_and(|v| !v.is_boolean()) {
        return Err(schema_error(location, "`uniqueItems` must be a boolean"));
    }

    Ok(())
}

// ============================================
// INSTANCE VALIDATION
// ============================================

fn type_matches(name: &str, value: &Value) -> bool {
    match name {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => false,
    }
}

struct Validator {
    path: Vec<String>,
}

impl Validator {
    fn fail(&self, instance: &Value, message: impl Into<String>) -> Violation {
        Violation {
            path: self.path.clone(),
            message: message.into(),
            instance: instance.clone(),
        }
    }

    fn nested<F>(&mut self, segment: String, f: F) -> Result<(), Violation>
    where
        F: FnOnce(&mut Self) -> Result<(), Violation>,
    {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }

    fn check(&mut self, instance: &Value, schema: &Value) -> Result<(), Violation> {
        let schema = match schema {
            Value::Bool(true) => return Ok(()),
            Value::Bool(false) => return Err(self.fail(instance, "value is not allowed here")),
            Value::Object(map) => map,
            _ => return Ok(()),
        };

        if let Some(ty) = schema.get("type") {
            let allowed: Vec<&str> = match ty {
                Value::Array(list) => list.iter().filter_map(Value::as_str).collect(),
                single => single.as_str().into_iter().collect(),
            };
            if !allowed.iter().any(|name| type_matches(name, instance)) {
                return Err(self.fail(instance, format!("{} is not of type {}", instance, allowed.join(" or "))));
            }
        }

        if let Some(options) = schema.get("enum").and_then(Value::as_array) {
            if !options.contains(instance) {
                return Err(self.fail(instance, format!("{} is not one of {}", instance, Value::Array(options.clone()))));
            }
        }
        if let Some(expected) = schema.get("const") {
            if expected != instance {
                return Err(self.fail(instance, format!("{} was expected", expected)));
            }
        }

        match instance {
            Value::Object(object) => self.check_object(object, instance, schema)?,
            Value::Array(items) => self.check_array(items, instance, schema)?,
            Value::String(text) => self.check_string(text, instance, schema)?,
            Value::Number(_) => self.check_number(instance, schema)?,
            _ => {}
        }
        Ok(())
    }

    fn check_object(
        &mut self,
        object: &Map<String, Value>,
        instance: &Value,
        schema: &Map<String, Value>,
    ) -> Result<(), Violation> {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    return Err(self.fail(instance, format!("'{}' is a required property", name)));
                }
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        for (key, value) in object {
            match properties.and_then(|p| p.get(key)) {
                Some(sub) => self.nested(key.clone(), |v| v.check(value, sub))?,
                None => {
                    if let Some(additional) = schema.get("additionalProperties") {
                        if additional == &Value::Bool(false) {
                            return Err(self.fail(
                                instance,
                                format!("additional property '{}' is not allowed", key),
                            ));
                        }
                        self.nested(key.clone(), |v| v.check(value, additional))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_array(&mut self, items: &[Value], instance: &Value, schema: &Map<String, Value>) -> Result<(), Violation> {
        if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
            if (items.len() as u64) < min {
                return Err(self.fail(instance, format!("expected at least {} items", min)));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
            if items.len() as u64 > max {
                return Err(self.fail(instance, format!("expected at most {} items", max)));
            }
        }
        if schema.get("uniqueItems").and_then(Value::as_bool) == Some(true) {
            if let Some(index) = (1..items.len()).find(|&i| items[..i].contains(&items[i])) {
                return Err(self.fail(instance, format!("item {} is not unique", index)));
            }
        }
        if let Some(item_schema) = schema.get("items") {
            for (index, item) in items.iter().enumerate() {
                self.nested(index.to_string(), |v| v.check(item, item_schema))?;
            }
        }
        Ok(())
    }

    fn check_string(&mut self, text: &str, instance: &Value, schema: &Map<String, Value>) -> Result<(), Violation> {
        let length = text.chars().count() as u64;
        if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
            if length < min {
                return Err(self.fail(instance, format!("{} is shorter than {}", instance, min)));
            }
        }
        if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
            if length > max {
                return Err(self.fail(instance, format!("{} is longer than {}", instance, max)));
            }
        }
        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
            // `check_schema` rejects patterns that do not compile
            if let Ok(re) = Regex::new(pattern) {
                if !re.is_match(text) {
                    return Err(self.fail(instance, format!("{} does not match '{}'", instance, pattern)));
                }
            }
        }
        Ok(())
    }

    fn check_number(&mut self, instance: &Value, schema: &Map<String, Value>) -> Result<(), Violation> {
        let Some(number) = instance.as_f64() else {
            return Ok(());
        };
        if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
            if number < min {
                return Err(self.fail(instance, format!("{} is less than the minimum of {}", instance, min)));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
            if number > max {
                return Err(self.fail(instance, format!("{} is greater than the maximum of {}", instance, max)));
            }
        }
        if let Some(min) = schema.get("exclusiveMinimum").and_then(Value::as_f64) {
            if number <= min {
                return Err(self.fail(instance, format!("{} is less than or equal to {}", instance, min)));
            }
        }
        if let Some(max) = schema.get("exclusiveMaximum").and_then(Value::as_f64) {
            if number >= max {
                return Err(self.fail(instance, format!("{} is greater than or equal to {}", instance, max)));
            }
        }
        Ok(())
    }
}

/// Validate `instance` against `schema`, stopping at the first violation
pub fn validate(instance: &Value, schema: &Value) -> Result<(), Violation> {
    Validator { path: Vec::new() }.check(instance, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed_schema() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "array",
            "minItems": 1,
            "items": {
                "type": "object",
                "required": ["name", "host", "netid"],
                "additionalProperties": false,
                "properties": {
                    "name": {"type": "string", "minLength": 1},
                    "host": {"type": "string", "pattern": "^[a-z0-9.-]+$"},
                    "type": {"enum": ["domain", "ip"]},
                    "wss": {"type": "boolean"},
                    "netid": {"type": "integer", "minimum": 0, "maximum": 14428},
                    "contact": {"type": "array", "items": {"type": "object"}}
                }
            }
        })
    }

    #[test]
    fn test_valid_document() {
        let schema = seed_schema();
        check_schema(&schema).unwrap();
        let nodes = json!([
            {"name": "seed-1", "host": "seed1.example.com", "type": "domain", "wss": true, "netid": 8762, "contact": [{"email": "ops@example.com"}]}
        ]);
        assert!(validate(&nodes, &schema).is_ok());
    }

    #[test]
    fn test_violation_reports_path() {
        let schema = seed_schema();
        let nodes = json!([
            {"name": "ok", "host": "a.example", "netid": 1},
            {"name": "bad", "host": "b.example", "netid": 20000}
        ]);
        let violation = validate(&nodes, &schema).unwrap_err();
        assert_eq!(violation.path, vec!["1".to_string(), "netid".to_string()]);
        assert_eq!(violation.path_str(), "1 -> netid");
        assert_eq!(violation.instance, json!(20000));
    }

    #[test]
    fn test_required_additional_and_pattern() {
        let schema = seed_schema();
        let missing = validate(&json!([{"name": "x", "host": "h"}]), &schema).unwrap_err();
        assert!(missing.message.contains("'netid' is a required property"));

        let extra = validate(&json!([{"name": "x", "host": "h", "netid": 1, "port": 1}]), &schema).unwrap_err();
        assert!(extra.message.contains("'port'"));

        let pattern = validate(&json!([{"name": "x", "host": "Bad Host", "netid": 1}]), &schema).unwrap_err();
        assert_eq!(pattern.path_str(), "0 -> host");

        assert!(validate(&json!([]), &schema).is_err());
    }

    #[test]
    fn test_malformed_schema() {
        let err = check_schema(&json!({"type": "widget"})).unwrap_err();
        assert_eq!(err.code, ErrorCode::SeedSchemaInvalid);
        assert!(check_schema(&json!({"pattern": "("})).is_err());
        assert!(check_schema(&json!({"items": {"minItems": -1}})).is_err());
        assert!(check_schema(&json!(42)).is_err());
    }

    #[test]
    fn test_const_and_unique_items() {
        let schema = json!({
            "type": "array",
            "uniqueItems": true,
            "items": {
                "type": "object",
                "properties": {"host": {"const": "a.example"}}
            }
        });
        check_schema(&schema).unwrap();

        let twice = json!([{"host": "a.example"}, {"host": "a.example"}]);
        let violation = validate(&twice, &schema).unwrap_err();
        assert!(violation.message.contains("not unique"));

        let other = validate(&json!([{"host": "b.example"}]), &schema).unwrap_err();
        assert_eq!(other.path_str(), "0 -> host");
        assert!(validate(&json!([{"host": "a.example"}]), &schema).is_ok());
    }

    #[test]
    fn test_exclusive_bounds() {
        let schema = json!({"type": "integer", "exclusiveMinimum": 0, "exclusiveMaximum": 10});
        check_schema(&schema).unwrap();
        assert!(validate(&json!(0), &schema).is_err());
        assert!(validate(&json!(10), &schema).is_err());
        assert!(validate(&json!(5), &schema).is_ok());
    }

    #[test]
    fn test_unenforced_keywords_are_rejected() {
        for schema in [
            json!({"items": {"oneOf": [{"type": "string"}, {"type": "integer"}]}}),
            json!({"$defs": {"node": {"type": "object"}}, "items": {"$ref": "#/$defs/node"}}),
            json!({"properties": {"host": {"anyOf": [{"const": "a"}]}}}),
            json!({"type": "object", "minProperties": 1}),
        ] {
            let err = check_schema(&schema).unwrap_err();
            assert_eq!(err.code, ErrorCode::SeedSchemaInvalid);
            assert!(err.message.contains("not supported"));
        }
        assert!(check_schema(&json!({"type": "string", "format": "hostname"})).is_ok());
    }
}
