//! Value validation against [`SchemaNode`] descriptors.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{DefinitionError, SchemaError};
use crate::schema::{SchemaNode, SchemaType};

/// The `pattern` constraints of a schema tree, compiled once.
///
/// Keyed by pattern text, so a pattern shared by several nodes is compiled
/// a single time.
#[derive(Debug, Clone, Default)]
pub struct CompiledPatterns {
    regexes: HashMap<String, Regex>,
}

impl CompiledPatterns {
    /// Compiles every `pattern` found in `schema`, its properties and items.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidPattern`] for the first pattern that
    /// is not a valid regular expression.
    pub fn compile(schema: &SchemaNode) -> Result<Self, DefinitionError> {
        let mut patterns = Self::default();
        patterns.collect(schema)?;
        Ok(patterns)
    }

    fn collect(&mut self, schema: &SchemaNode) -> Result<(), DefinitionError> {
        if let Some(pattern) = &schema.pattern {
            if let Entry::Vacant(slot) = self.regexes.entry(pattern.clone()) {
                let regex = Regex::new(pattern).map_err(|e| DefinitionError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
                slot.insert(regex);
            }
        }
        for property in schema.properties.values() {
            self.collect(property)?;
        }
        if let Some(items) = &schema.items {
            self.collect(items)?;
        }
        Ok(())
    }

    /// The compiled form of `pattern`, if the schema declared it.
    #[must_use]
    pub fn get(&self, pattern: &str) -> Option<&Regex> {
        self.regexes.get(pattern)
    }

    /// Number of distinct patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regexes.len()
    }

    /// Returns `true` if the schema declares no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty()
    }
}

/// Validates `value` against `schema`, checking kinds and required members.
///
/// Returns the value unchanged on success. Length, range and pattern
/// constraints are not enforced; see [`validate_strict`].
///
/// # Errors
///
/// Returns [`SchemaError::TypeMismatch`] for a wrong primitive kind and
/// [`SchemaError::MissingRequiredFields`] when an object lacks required
/// members. Validation stops at the first failure.
pub fn validate<'a>(value: &'a Value, schema: &SchemaNode) -> Result<&'a Value, SchemaError> {
    check(value, schema, "$", None)?;
    Ok(value)
}

/// Validates `value` against `schema`, also enforcing constraints.
///
/// In addition to [`validate`], checks `minLength`/`maxLength`, `pattern`,
/// `minimum`/`maximum`, `minItems`/`maxItems` and validates every array
/// element against `items`. `patterns` must come from
/// [`CompiledPatterns::compile`] on the same schema.
///
/// # Errors
///
/// Returns any error [`validate`] returns, or
/// [`SchemaError::ConstraintViolation`].
pub fn validate_strict<'a>(
    value: &'a Value,
    schema: &SchemaNode,
    patterns: &CompiledPatterns,
) -> Result<&'a Value, SchemaError> {
    check(value, schema, "$", Some(patterns))?;
    Ok(value)
}

/// Returns the JSON type name of a value, as used in error messages.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_f64() {
                "number"
            } else {
                "integer"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches_kind(kind: SchemaType, value: &Value) -> bool {
    match kind {
        SchemaType::String => value.is_string(),
        SchemaType::Integer => value.is_i64() || value.is_u64(),
        SchemaType::Number => value.is_number(),
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Object => value.is_object(),
        SchemaType::Array => value.is_array(),
    }
}

/// `patterns` is `Some` in strict mode.
fn check(
    value: &Value,
    schema: &SchemaNode,
    path: &str,
    patterns: Option<&CompiledPatterns>,
) -> Result<(), SchemaError> {
    if !matches_kind(schema.kind, value) {
        return Err(SchemaError::TypeMismatch {
            path: path.to_string(),
            expected: schema.kind,
            actual: json_type_name(value),
        });
    }

    match value {
        Value::Object(members) => check_object(members, schema, path, patterns),
        Value::Array(items) => patterns.map_or(Ok(()), |p| check_array(items, schema, path, p)),
        Value::String(s) => patterns.map_or(Ok(()), |p| check_string(s, schema, path, p)),
        Value::Number(n) if patterns.is_some() => n
            .as_f64()
            .map_or(Ok(()), |n| check_number(n, schema, path)),
        _ => Ok(()),
    }
}

fn check_object(
    members: &Map<String, Value>,
    schema: &SchemaNode,
    path: &str,
    patterns: Option<&CompiledPatterns>,
) -> Result<(), SchemaError> {
    let missing: Vec<String> = schema
        .required
        .iter()
        .filter(|name| !members.contains_key(name.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(SchemaError::MissingRequiredFields {
            path: path.to_string(),
            fields: missing,
        });
    }

    for (name, property) in &schema.properties {
        if let Some(member) = members.get(name) {
            check(member, property, &format!("{path}.{name}"), patterns)?;
        }
    }

    Ok(())
}

fn check_array(
    items: &[Value],
    schema: &SchemaNode,
    path: &str,
    patterns: &CompiledPatterns,
) -> Result<(), SchemaError> {
    let len = items.len() as u64;
    if let Some(min) = schema.min_items.filter(|min| len < *min) {
        return Err(violation(
            path,
            "minItems",
            format!("expected at least {min} items, got {len}"),
        ));
    }
    if let Some(max) = schema.max_items.filter(|max| len > *max) {
        return Err(violation(
            path,
            "maxItems",
            format!("expected at most {max} items, got {len}"),
        ));
    }

    if let Some(item_schema) = &schema.items {
        for (index, item) in items.iter().enumerate() {
            check(item, item_schema, &format!("{path}[{index}]"), Some(patterns))?;
        }
    }

    Ok(())
}

fn check_string(
    s: &str,
    schema: &SchemaNode,
    path: &str,
    patterns: &CompiledPatterns,
) -> Result<(), SchemaError> {
    let len = s.chars().count() as u64;
    if let Some(min) = schema.min_length.filter(|min| len < *min) {
        return Err(violation(
            path,
            "minLength",
            format!("expected at least {min} characters, got {len}"),
        ));
    }
    if let Some(max) = schema.max_length.filter(|max| len > *max) {
        return Err(violation(
            path,
            "maxLength",
            format!("expected at most {max} characters, got {len}"),
        ));
    }

    if let Some(pattern) = &schema.pattern {
        let regex = patterns.get(pattern).ok_or_else(|| {
            violation(
                path,
                "pattern",
                format!("pattern '{pattern}' was not compiled for this schema"),
            )
        })?;
        if !regex.is_match(s) {
            return Err(violation(
                path,
                "pattern",
                format!("value does not match pattern '{pattern}'"),
            ));
        }
    }

    Ok(())
}

fn check_number(n: f64, schema: &SchemaNode, path: &str) -> Result<(), SchemaError> {
    if let Some(min) = schema.minimum.filter(|min| n < *min) {
        return Err(violation(
            path,
            "minimum",
            format!("{n} is less than {min}"),
        ));
    }
    if let Some(max) = schema.maximum.filter(|max| n > *max) {
        return Err(violation(
            path,
            "maximum",
            format!("{n} is greater than {max}"),
        ));
    }
    Ok(())
}

fn violation(path: &str, constraint: &'static str, message: String) -> SchemaError {
    SchemaError::ConstraintViolation {
        path: path.to_string(),
        constraint,
        message,
    }
}
