use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use stockroom_core::domain::operation::{validate, RawOperationRequest};

use crate::conversation::{ToolCall, ToolDefinition};
use crate::executor::OperationExecutor;

pub const MANAGE_INVENTORY: &str = "manage_inventory";

/// Text handed back to the model; `is_error` only affects logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_error: false }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_error: true }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> Value;
    async fn execute(&self, input: Value) -> ToolOutput;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        match self.tools.get(&call.name) {
            Some(tool) => tool.execute(call.arguments.clone()).await,
            None => ToolOutput::error(format!(
                "Error: unknown tool `{}`. Available tools: {}.",
                call.name,
                self.tools.keys().cloned().collect::<Vec<_>>().join(", ")
            )),
        }
    }
}

pub struct ManageInventoryTool {
    executor: OperationExecutor,
}

impl ManageInventoryTool {
    pub fn new(executor: OperationExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for ManageInventoryTool {
    fn name(&self) -> &'static str {
        MANAGE_INVENTORY
    }

    fn description(&self) -> &'static str {
        "Manage inventory by creating, updating, or deleting items. \
         For 'create' provide name and quantity. For 'update' provide id, name and quantity. \
         For 'delete' provide id."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["create", "update", "delete"],
                    "description": "Which inventory operation to perform"
                },
                "id": {
                    "type": "integer",
                    "description": "Existing item id (update, delete)"
                },
                "name": {
                    "type": "string",
                    "description": "Item name (create, update)"
                },
                "quantity": {
                    "type": "integer",
                    "description": "Item quantity (create, update)"
                }
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, input: Value) -> ToolOutput {
        let raw = match serde_json::from_value::<RawOperationRequest>(input) {
            Ok(raw) => raw,
            Err(error) => {
                return ToolOutput::error(format!(
                    "Error: could not read {MANAGE_INVENTORY} arguments: {error}"
                ))
            }
        };

        let op = match validate(raw) {
            Ok(op) => op,
            Err(error) => return ToolOutput::error(format!("Error: {error}")),
        };

        let outcome = self.executor.execute(op).await;
        if outcome.is_success() {
            ToolOutput::ok(outcome.to_string())
        } else {
            ToolOutput::error(outcome.to_string())
        }
    }
}
