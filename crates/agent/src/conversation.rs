use serde_json::Value;

/// Fixed operation contract sent as the system instruction on every round.
pub const OPERATION_INSTRUCTIONS: &str = "\
You are a helpful assistant for managing an inventory of named, quantified items.

You have access to the `manage_inventory` tool, which you must use for every inventory change.
Never describe a change as done unless the tool reported it.

- To CREATE a new item, call `manage_inventory` with `operation` set to \"create\" and provide `name` and `quantity`. Do not provide an `id`.
- To UPDATE an existing item, call `manage_inventory` with `operation` set to \"update\" and provide `id`, the new `name`, and the new `quantity`.
- To DELETE an item, call `manage_inventory` with `operation` set to \"delete\" and provide `id`.

Tool results starting with \"Error:\" mean nothing was changed.

When you are done, reply with only a JSON object of this shape and no other text:
{\"classification\": \"is_inventory\" | \"not_inventory\", \"summary\": \"<what was done>\"}
Use \"is_inventory\" when the request was about the inventory (whether or not the tool succeeded), otherwise \"not_inventory\".";

#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChatMessage {
    User(String),
    AssistantToolCalls(Vec<ToolCall>),
    ToolResult { call_id: String, content: String },
}

/// Everything the collaborator sees on a round trip. Owned by a single run.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationContext {
    instructions: String,
    tools: Vec<ToolDefinition>,
    messages: Vec<ChatMessage>,
}

impl ConversationContext {
    pub fn new(
        instructions: impl Into<String>,
        intent: impl Into<String>,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            instructions: instructions.into(),
            tools,
            messages: vec![ChatMessage::User(intent.into())],
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_tool_calls(&mut self, calls: Vec<ToolCall>) {
        self.messages.push(ChatMessage::AssistantToolCalls(calls));
    }

    pub fn push_tool_result(&mut self, call_id: impl Into<String>, content: impl Into<String>) {
        self.messages.push(ChatMessage::ToolResult {
            call_id: call_id.into(),
            content: content.into(),
        });
    }

    pub fn tool_results(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                ChatMessage::ToolResult { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChatMessage, ConversationContext, ToolCall, OPERATION_INSTRUCTIONS};

    #[test]
    fn instructions_fix_vocabulary_and_summary_shape() {
        for word in ["\"create\"", "\"update\"", "\"delete\"", "classification", "summary"] {
            assert!(OPERATION_INSTRUCTIONS.contains(word), "instructions must mention {word}");
        }
    }

    #[test]
    fn transcript_keeps_call_then_result_order() {
        let mut context = ConversationContext::new(OPERATION_INSTRUCTIONS, "delete item 2", vec![]);
        context.push_tool_calls(vec![ToolCall {
            id: "call_0".to_string(),
            name: "manage_inventory".to_string(),
            arguments: json!({"operation": "delete", "id": 2}),
        }]);
        context.push_tool_result("call_0", "Error: Item with ID 2 not found.");

        assert!(matches!(
            context.messages()[0],
            ChatMessage::User(ref text) if text == "delete item 2"
        ));
        assert!(matches!(
            context.messages()[1],
            ChatMessage::AssistantToolCalls(ref calls) if calls.len() == 1
        ));
        assert_eq!(context.tool_results(), vec!["Error: Item with ID 2 not found."]);
    }
}
