//! Resources: definitions, list formatting and reading.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::capability::handler::{guarded, ResourceHandler};
use crate::capability::template::UriTemplate;
use crate::error::{DefinitionError, DispatchError};

/// MIME type used when a resource does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// A registered resource, addressed by a URI or URI template.
#[derive(Clone)]
pub struct Resource {
    template: UriTemplate,
    name: String,
    description: Option<String>,
    mime_type: String,
    handler: Arc<dyn ResourceHandler>,
}

impl Resource {
    /// Creates a resource. `uri` may contain `{param}` placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidUriTemplate`] if `uri` is not a
    /// well-formed template.
    pub fn new(
        uri: &str,
        name: impl Into<String>,
        handler: impl ResourceHandler + 'static,
    ) -> Result<Self, DefinitionError> {
        Ok(Self {
            template: UriTemplate::parse(uri)?,
            name: name.into(),
            description: None,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            handler: Arc::new(handler),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// The URI template string (registry key).
    #[must_use]
    pub fn uri(&self) -> &str {
        self.template.as_str()
    }

    /// The parsed template.
    #[must_use]
    pub const fn template(&self) -> &UriTemplate {
        &self.template
    }

    /// The resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The MIME type of the content.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Renders the `resources/list` entry.
    #[must_use]
    pub fn definition(&self) -> ResourceDefinition {
        ResourceDefinition {
            uri: self.uri().to_string(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            description: self.description.clone(),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("uri", &self.template.as_str())
            .field("name", &self.name)
            .field("description", &self.description)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// A resource definition for the `resources/list` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    /// URI or URI template.
    pub uri: String,
    /// Human-readable name.
    pub name: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Matches `uri` against the resource template, runs the handler and shapes
/// its result.
///
/// # Errors
///
/// - [`DispatchError::UriNotMatched`] if `uri` does not fit the template
///   (the handler is not called)
/// - [`DispatchError::HandlerFailed`] if the handler fails or panics
pub fn read_resource(resource: &Resource, uri: &str) -> Result<Value, DispatchError> {
    let params = resource.template.match_uri(uri)?;

    let output = guarded(|| resource.handler.read(&params)).map_err(|source| {
        DispatchError::HandlerFailed {
            capability: format!("resource '{}'", resource.uri()),
            source,
        }
    })?;

    Ok(shape_resource_result(output, uri, &resource.mime_type))
}

/// Wraps a handler's raw output into the `resources/read` result envelope.
///
/// - string → one text content item
/// - object with `contents` → passed through unchanged
/// - anything else → its JSON rendering as text
#[must_use]
pub fn shape_resource_result(output: Value, uri: &str, mime_type: &str) -> Value {
    let text = match output {
        Value::String(text) => text,
        Value::Object(_) if output.get("contents").is_some() => return output,
        other => other.to_string(),
    };

    json!({
        "contents": [{
            "uri": uri,
            "mimeType": mime_type,
            "text": text,
        }],
    })
}
