//! Capability registry.

use indexmap::IndexMap;

use crate::capability::prompt::{Prompt, PromptDefinition};
use crate::capability::resource::{Resource, ResourceDefinition};
use crate::capability::tool::{Tool, ToolDefinition};

/// Tools, resources and prompts registered with one server.
///
/// Each kind is keyed independently (tools and prompts by name, resources by
/// URI template) and listed in order of first registration. Registering an
/// existing key replaces the entry in place and returns the old one.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tools: IndexMap<String, Tool>,
    resources: IndexMap<String, Resource>,
    prompts: IndexMap<String, Prompt>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, returning the entry it replaced.
    pub fn register_tool(&mut self, tool: Tool) -> Option<Tool> {
        self.tools.insert(tool.name().to_string(), tool)
    }

    /// Registers a resource, returning the entry it replaced.
    pub fn register_resource(&mut self, resource: Resource) -> Option<Resource> {
        self.resources.insert(resource.uri().to_string(), resource)
    }

    /// Registers a prompt, returning the entry it replaced.
    pub fn register_prompt(&mut self, prompt: Prompt) -> Option<Prompt> {
        self.prompts.insert(prompt.name().to_string(), prompt)
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Looks up a resource by its registered URI template.
    #[must_use]
    pub fn resource(&self, uri: &str) -> Option<&Resource> {
        self.resources.get(uri)
    }

    /// Looks up a prompt by name.
    #[must_use]
    pub fn prompt(&self, name: &str) -> Option<&Prompt> {
        self.prompts.get(name)
    }

    /// Finds the resource serving a concrete URI.
    ///
    /// An entry whose key equals `uri` wins; otherwise templates are tried in
    /// registration order and the first match is returned.
    #[must_use]
    pub fn resolve_resource(&self, uri: &str) -> Option<&Resource> {
        self.resources.get(uri).or_else(|| {
            self.resources
                .values()
                .find(|resource| resource.template().matches(uri))
        })
    }

    /// Iterates tools in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    /// Iterates resources in registration order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Iterates prompts in registration order.
    pub fn prompts(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.values()
    }

    /// `tools/list` entries.
    #[must_use]
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(Tool::definition).collect()
    }

    /// `resources/list` entries.
    #[must_use]
    pub fn resource_definitions(&self) -> Vec<ResourceDefinition> {
        self.resources.values().map(Resource::definition).collect()
    }

    /// `prompts/list` entries.
    #[must_use]
    pub fn prompt_definitions(&self) -> Vec<PromptDefinition> {
        self.prompts.values().map(Prompt::definition).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Number of registered resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Number of registered prompts.
    #[must_use]
    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.resources.is_empty() && self.prompts.is_empty()
    }
}
