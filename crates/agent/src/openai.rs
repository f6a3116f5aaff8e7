//! OpenAI-compatible chat completions client.
//!
//! Gemini, OpenAI and Ollama all accept the same request shape, so one client
//! covers every configured provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use stockroom_core::config::LlmConfig;
use stockroom_core::domain::summary::FinalSummary;

use crate::conversation::{ChatMessage, ConversationContext, ToolCall};
use crate::llm::{CollaboratorError, ModelCollaborator, ModelStep};

pub struct OpenAiCompatibleClient {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| CollaboratorError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: completions_endpoint(config.effective_base_url()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl ModelCollaborator for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn submit(&self, context: &ConversationContext) -> Result<ModelStep, CollaboratorError> {
        let body = build_request_body(&self.model, context);
        debug!(
            event_name = "agent.llm.request",
            model = %self.model,
            messages = context.messages().len(),
            "submitting chat completion request"
        );

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| CollaboratorError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status { status: status.as_u16(), body });
        }

        let raw = response
            .json::<Value>()
            .await
            .map_err(|error| CollaboratorError::MalformedResponse(error.to_string()))?;

        parse_completion(&raw)
    }
}

pub fn build_request_body(model: &str, context: &ConversationContext) -> Value {
    let mut messages = vec![json!({ "role": "system", "content": context.instructions() })];

    for message in context.messages() {
        messages.push(match message {
            ChatMessage::User(text) => json!({ "role": "user", "content": text }),
            ChatMessage::AssistantToolCalls(calls) => {
                let tool_calls = calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            },
                        })
                    })
                    .collect::<Vec<_>>();
                json!({ "role": "assistant", "content": Value::Null, "tool_calls": tool_calls })
            }
            ChatMessage::ToolResult { call_id, content } => {
                json!({ "role": "tool", "tool_call_id": call_id, "content": content })
            }
        });
    }

    let mut body = json!({ "model": model, "messages": messages });
    if !context.tools().is_empty() {
        body["tools"] = Value::Array(
            context
                .tools()
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        },
                    })
                })
                .collect(),
        );
        body["tool_choice"] = json!("auto");
    }

    body
}

pub fn parse_completion(raw: &Value) -> Result<ModelStep, CollaboratorError> {
    let message = raw
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| {
            CollaboratorError::MalformedResponse("response has no choices[0].message".to_string())
        })?;

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .filter(|calls| !calls.is_empty());
    if let Some(calls) = tool_calls {
        let parsed = calls
            .iter()
            .enumerate()
            .map(|(index, call)| parse_tool_call(index, call))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ModelStep::ToolCalls(parsed));
    }

    let content = message.get("content").and_then(Value::as_str).ok_or_else(|| {
        CollaboratorError::MalformedResponse(
            "response carried neither tool calls nor text content".to_string(),
        )
    })?;

    Ok(ModelStep::Final(parse_final_summary(content)?))
}

fn parse_tool_call(index: usize, call: &Value) -> Result<ToolCall, CollaboratorError> {
    let function = call.get("function").ok_or_else(|| {
        CollaboratorError::MalformedResponse(format!("tool call {index} has no function"))
    })?;
    let name = function.get("name").and_then(Value::as_str).ok_or_else(|| {
        CollaboratorError::MalformedResponse(format!("tool call {index} has no function name"))
    })?;
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{index}"));

    // Arguments arrive as a JSON-encoded string. Undecodable text is passed
    // through so the tool can report it back to the model.
    let arguments = match function.get("arguments") {
        Some(Value::String(encoded)) => {
            serde_json::from_str(encoded).unwrap_or_else(|_| Value::String(encoded.clone()))
        }
        Some(Value::Null) | None => json!({}),
        Some(other) => other.clone(),
    };

    Ok(ToolCall { id, name: name.to_string(), arguments })
}

/// Accepts a bare JSON object, a fenced code block, or an object wrapped in prose.
///
/// Every `{` is tried as a start position, so braces in surrounding text do
/// not hide a later summary object.
pub fn parse_final_summary(content: &str) -> Result<FinalSummary, CollaboratorError> {
    let trimmed = content.trim();
    let mut last_error = None;

    for (start, _) in trimmed.match_indices('{') {
        let mut values =
            serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<FinalSummary>();
        match values.next() {
            Some(Ok(summary)) => return Ok(summary),
            Some(Err(error)) => last_error = Some(error),
            None => {}
        }
    }

    Err(match last_error {
        Some(error) => {
            CollaboratorError::MalformedResponse(format!("final summary did not parse: {error}"))
        }
        None => CollaboratorError::MalformedResponse(format!(
            "final answer is not a JSON summary: {trimmed}"
        )),
    })
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use stockroom_core::config::{LlmConfig, LlmProvider};
    use stockroom_core::domain::summary::Classification;

    use super::{
        build_request_body, completions_endpoint, parse_completion, parse_final_summary,
        OpenAiCompatibleClient,
    };
    use crate::conversation::{ConversationContext, ToolCall, ToolDefinition};
    use crate::llm::{CollaboratorError, ModelCollaborator, ModelStep};

    fn client_for(base_url: String) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::from_config(&LlmConfig {
            provider: LlmProvider::Openai,
            api_key: Some(SecretString::from("sk-test".to_string())),
            base_url: Some(base_url),
            model: "gpt-test".to_string(),
            timeout_secs: 5,
        })
        .expect("client builds")
    }

    fn context() -> ConversationContext {
        ConversationContext::new("be precise", "delete item 2", Vec::new())
    }

    /// Serves one canned HTTP response and returns the raw request it received.
    async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let read = stream.read(&mut buf).await.expect("read request");
                request.extend_from_slice(&buf[..read]);
                if read == 0 || request_complete(&request) {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).await.expect("write response");
            stream.shutdown().await.expect("shutdown");
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://127.0.0.1:{port}/v1"), server)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        assert_eq!(
            completions_endpoint("https://generativelanguage.googleapis.com/v1beta/openai/"),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );
        assert_eq!(
            completions_endpoint("http://localhost:11434/v1"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_carries_system_tools_and_transcript() {
        let mut context = ConversationContext::new(
            "be precise",
            "add 10 units of Bolt",
            vec![ToolDefinition {
                name: "manage_inventory".to_string(),
                description: "mutate inventory".to_string(),
                parameters: json!({"type": "object"}),
            }],
        );
        context.push_tool_calls(vec![ToolCall {
            id: "call_a".to_string(),
            name: "manage_inventory".to_string(),
            arguments: json!({"operation": "create", "name": "Bolt", "quantity": 10}),
        }]);
        context.push_tool_result("call_a", "Added Bolt with ID 1 and quantity 10.");

        let body = build_request_body("gemini-2.0-flash", &context);

        assert_eq!(body["model"], "gemini-2.0-flash");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "add 10 units of Bolt");
        assert_eq!(body["messages"][2]["tool_calls"][0]["function"]["name"], "manage_inventory");
        let encoded = body["messages"][2]["tool_calls"][0]["function"]["arguments"]
            .as_str()
            .expect("arguments are string encoded");
        assert!(encoded.contains("\"Bolt\""));
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "call_a");
        assert_eq!(body["tools"][0]["function"]["name"], "manage_inventory");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn tool_calls_are_parsed_with_decoded_arguments() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "manage_inventory",
                            "arguments": "{\"operation\":\"delete\",\"id\":2}"
                        }
                    }]
                }
            }]
        });

        let step = parse_completion(&raw).expect("tool call step");
        let ModelStep::ToolCalls(calls) = step else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].arguments, json!({"operation": "delete", "id": 2}));
    }

    #[test]
    fn missing_call_id_gets_positional_id() {
        let raw = json!({
            "choices": [{ "message": { "tool_calls": [
                { "function": { "name": "manage_inventory", "arguments": "not json" } }
            ]}}]
        });

        let ModelStep::ToolCalls(calls) = parse_completion(&raw).expect("step") else {
            panic!("expected tool calls");
        };
        assert_eq!(calls[0].id, "call_0");
        assert_eq!(calls[0].arguments, json!("not json"));
    }

    #[test]
    fn final_content_is_parsed_into_summary() {
        let raw = json!({
            "choices": [{ "message": {
                "content": "```json\n{\"classification\": \"is_inventory\", \"summary\": \"Added Bolt.\"}\n```"
            }}]
        });

        let ModelStep::Final(summary) = parse_completion(&raw).expect("step") else {
            panic!("expected final summary");
        };
        assert_eq!(summary.classification, Classification::IsInventory);
        assert_eq!(summary.summary, "Added Bolt.");
    }

    #[test]
    fn prose_without_json_is_malformed() {
        let error = parse_final_summary("I deleted the item for you.").expect_err("no json");
        assert!(matches!(error, CollaboratorError::MalformedResponse(_)));
    }

    #[test]
    fn missing_choices_is_malformed() {
        let error = parse_completion(&json!({"error": "quota"})).expect_err("no choices");
        assert!(matches!(error, CollaboratorError::MalformedResponse(_)));
    }

    #[test]
    fn braces_in_prose_before_summary_are_skipped() {
        let summary = parse_final_summary(
            "Done {ok}. {\"classification\": \"is_inventory\", \"summary\": \"Deleted 2.\"} Bye}",
        )
        .expect("summary after prose braces");
        assert_eq!(summary.classification, Classification::IsInventory);
        assert_eq!(summary.summary, "Deleted 2.");
    }

    #[test]
    fn unparseable_object_reports_parse_error() {
        let error =
            parse_final_summary("{\"classification\": \"maybe\"}").expect_err("bad value");
        assert!(matches!(
            error,
            CollaboratorError::MalformedResponse(ref message) if message.contains("did not parse")
        ));
    }

    #[tokio::test]
    async fn client_posts_bearer_request_and_parses_reply() {
        let reply = json!({
            "choices": [{ "message": {
                "content": "{\"classification\": \"not_inventory\", \"summary\": \"Hi.\"}"
            }}]
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", &reply).await;

        let step = client_for(base_url).submit(&context()).await.expect("final step");
        let request = server.await.expect("server task");

        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains("\"model\":\"gpt-test\""));
        let ModelStep::Final(summary) = step else {
            panic!("expected final summary");
        };
        assert_eq!(summary.classification, Classification::NotInventory);
    }

    #[tokio::test]
    async fn error_status_is_a_status_failure_with_body() {
        let (base_url, server) =
            serve_once("503 Service Unavailable", "{\"error\":\"overloaded\"}").await;

        let error = client_for(base_url).submit(&context()).await.expect_err("status failure");
        server.await.expect("server task");

        assert_eq!(
            error,
            CollaboratorError::Status {
                status: 503,
                body: "{\"error\":\"overloaded\"}".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let error = client_for(format!("http://127.0.0.1:{port}/v1"))
            .submit(&context())
            .await
            .expect_err("connection refused");
        assert!(matches!(error, CollaboratorError::Transport(_)));
    }

    #[tokio::test]
    async fn non_json_success_body_is_malformed() {
        let (base_url, server) = serve_once("200 OK", "<html>gateway</html>").await;

        let error = client_for(base_url).submit(&context()).await.expect_err("not json");
        server.await.expect("server task");
        assert!(matches!(error, CollaboratorError::MalformedResponse(_)));
    }
}
