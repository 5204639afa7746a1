//! Tool registry shared by the agent loop, the MCP server and the HTTP API.
//!
//! Every tool is a plain entry: name, description, JSON Schema for its
//! arguments, and a handler. Callers look tools up by name instead of relying
//! on any runtime discovery.

mod vibration;

use crate::error::{Result, VibraError};
use crate::service::VibrationService;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

/// Everything a tool handler may touch.
pub struct ToolContext {
    pub service: Arc<VibrationService>,
    /// Threshold used when a caller does not pass one.
    pub default_threshold: f64,
}

impl ToolContext {
    pub fn new(service: Arc<VibrationService>, default_threshold: f64) -> Self {
        Self {
            service,
            default_threshold,
        }
    }
}

/// Result of a tool call: text for a chat turn, JSON for programmatic callers.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub text: String,
    pub data: Value,
}

impl ToolOutput {
    /// Render a structured outcome both ways.
    pub fn from_outcome<T: Serialize + Display>(outcome: &T) -> Result<Self> {
        Ok(Self {
            text: outcome.to_string(),
            data: serde_json::to_value(outcome)?,
        })
    }
}

/// Async tool entry point.
pub type ToolHandler = for<'a> fn(&'a ToolContext, Value) -> BoxFuture<'a, Result<ToolOutput>>;

/// A registered tool.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub handler: ToolHandler,
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

/// Ordered table of tools, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the vibration tools and the clock.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for spec in vibration::specs() {
            registry.register(spec);
        }
        registry
    }

    /// Register a tool. Replaces an existing tool with the same name.
    pub fn register(&mut self, spec: ToolSpec) {
        match self.tools.iter_mut().find(|t| t.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.tools.push(spec),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up and run a tool.
    pub async fn invoke(&self, ctx: &ToolContext, name: &str, arguments: Value) -> Result<ToolOutput> {
        let spec = self
            .get(name)
            .ok_or_else(|| VibraError::Agent(format!("Unknown tool: {}", name)))?;

        info!("Calling tool {} with args {}", name, arguments);
        (spec.handler)(ctx, arguments).await
    }

    /// Run a tool whose arguments arrive as a JSON string (OpenAI tool calls).
    pub async fn invoke_json(&self, ctx: &ToolContext, name: &str, arguments: &str) -> Result<ToolOutput> {
        let arguments = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments)
                .map_err(|e| VibraError::InvalidInput(format!("Invalid tool arguments: {}", e)))?
        };
        self.invoke(ctx, name, arguments).await
    }

    /// OpenAI function definitions for every registered tool.
    pub fn openai_definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools
            .iter()
            .map(|spec| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: spec.name.to_string(),
                    description: Some(spec.description.to_string()),
                    parameters: Some(spec.input_schema.clone()),
                    strict: None,
                },
            })
            .collect()
    }
}

/// Decode a tool's arguments into its argument struct.
fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| VibraError::InvalidInput(format!("Invalid arguments for {}: {}", tool, e)))
}
