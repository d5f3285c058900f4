//! Minimal JSON-Schema-like descriptors and validation for capability inputs.
//!
//! This is not a JSON Schema implementation. It covers the subset MCP tools
//! declare: a primitive `type`, object `properties` with a `required` list,
//! array `items`, and a handful of constraint keywords.
//!
//! # Validation Modes
//!
//! - [`validate`] checks primitive kinds and required object members. Length,
//!   range and pattern constraints are carried as metadata only.
//! - [`validate_strict`] additionally enforces those constraints and recurses
//!   into array items. Its `pattern` regexes come precompiled in
//!   [`CompiledPatterns`].
//!
//! # Required Fields
//!
//! Two ways to build an object schema coexist and do not imply each other:
//!
//! - [`SchemaNode::from_field_types`] marks **every** listed field required.
//! - The long-form builder ([`SchemaNode::object`] with
//!   [`SchemaNode::property`] / [`SchemaNode::required_property`]) only
//!   requires what is explicitly opted in.

mod node;
mod validator;

pub use node::{SchemaNode, SchemaType};
pub use validator::{json_type_name, validate, validate_strict, CompiledPatterns};
