//! Capabilities: tools, resources and prompts.
//!
//! Each capability pairs its declared metadata with a user handler. The
//! per-kind executors ([`execute_tool`], [`read_resource`], [`render_prompt`])
//! validate input, call the handler behind a panic guard and shape the raw
//! output into the MCP result envelope.

mod handler;
mod prompt;
mod registry;
mod resource;
mod template;
mod tool;

pub use handler::{
    guarded, Arguments, HandlerError, HandlerResult, PromptHandler, ResourceHandler, ToolHandler,
};
pub use prompt::{render_prompt, shape_prompt_result, Prompt, PromptArgument, PromptDefinition};
pub use registry::Registry;
pub use resource::{
    read_resource, shape_resource_result, Resource, ResourceDefinition, DEFAULT_MIME_TYPE,
};
pub use template::{UriParams, UriTemplate};
pub use tool::{execute_tool, shape_tool_result, Tool, ToolDefinition};
