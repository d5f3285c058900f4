//! Schema descriptor types.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Primitive kind a schema node accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// JSON string.
    String,
    /// JSON number without a fractional part.
    Integer,
    /// Any JSON number.
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
}

impl SchemaType {
    /// Returns the JSON Schema keyword for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes the expected shape of a value.
///
/// Serialises to the equivalent JSON Schema object, so a tool's input schema
/// can be embedded verbatim in `tools/list` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// The accepted primitive kind.
    #[serde(rename = "type")]
    pub kind: SchemaType,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Minimum string length in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// Maximum string length in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// Regular expression a string must contain a match for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Inclusive lower bound for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    /// Inclusive upper bound for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    /// Minimum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    /// Maximum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    /// Object members, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,

    /// Object members that must be present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Schema for array elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    /// Creates an unconstrained node of the given kind.
    #[must_use]
    pub fn of(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            min_length: None,
            max_length: None,
            pattern: None,
            minimum: None,
            maximum: None,
            min_items: None,
            max_items: None,
            properties: IndexMap::new(),
            required: Vec::new(),
            items: None,
        }
    }

    /// A string node.
    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    /// An integer node.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(SchemaType::Integer)
    }

    /// A number node.
    #[must_use]
    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    /// A boolean node.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(SchemaType::Boolean)
    }

    /// An object node with no members.
    #[must_use]
    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    /// An array node whose elements match `items`.
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    /// Builds an object schema from a flat name → type mapping.
    ///
    /// Every listed field is required; there is no optional-field shorthand
    /// in this form.
    #[must_use]
    pub fn from_field_types<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaType)>,
        K: Into<String>,
    {
        let mut schema = Self::object();
        for (name, kind) in fields {
            schema = schema.required_property(name, Self::of(kind));
        }
        schema
    }

    /// Adds an optional object member.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Self) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Adds an object member and marks it required.
    #[must_use]
    pub fn required_property(mut self, name: impl Into<String>, schema: Self) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    /// Replaces the required list.
    #[must_use]
    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets string length bounds.
    #[must_use]
    pub fn with_length(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    /// Sets the string pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Sets numeric bounds.
    #[must_use]
    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Sets array length bounds.
    #[must_use]
    pub fn with_items_bounds(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_types_are_all_required() {
        let schema =
            SchemaNode::from_field_types([("a", SchemaType::Number), ("b", SchemaType::Number)]);
        assert_eq!(schema.kind, SchemaType::Object);
        assert_eq!(schema.required, vec!["a", "b"]);
        assert_eq!(schema.properties.len(), 2);
    }

    #[test]
    fn long_form_requires_only_opt_in() {
        let schema = SchemaNode::object()
            .required_property("name", SchemaNode::string())
            .property("age", SchemaNode::integer());
        assert_eq!(schema.required, vec!["name"]);
    }

    #[test]
    fn serialises_as_json_schema() {
        let schema = SchemaNode::object()
            .required_property(
                "query",
                SchemaNode::string()
                    .with_description("Search text")
                    .with_length(Some(1), Some(64)),
            )
            .property("tags", SchemaNode::array(SchemaNode::string()));

        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search text",
                        "minLength": 1,
                        "maxLength": 64
                    },
                    "tags": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["query"]
            })
        );
    }

    #[test]
    fn deserialise_round_trips_metadata() {
        let value = json!({
            "type": "object",
            "properties": {
                "count": { "type": "integer", "minimum": 0.0, "maximum": 10.0 }
            },
            "required": ["count"]
        });
        let schema: SchemaNode = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&schema).unwrap(), value);
    }
}
