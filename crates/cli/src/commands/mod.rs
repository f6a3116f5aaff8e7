pub mod run;

use serde::Serialize;
use stockroom_core::errors::ApplicationError;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'a str,
    error_class: &'a str,
    message: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    /// Renders a fatal error as a single JSON line for stderr.
    pub fn failure(command: &str, error: &ApplicationError) -> Self {
        let payload = CommandOutcome {
            command,
            status: "error",
            error_class: error.error_class(),
            message: format!("{} ({error})", error.user_message()),
        };
        Self { exit_code: 1, output: serialize_payload(&payload) }
    }
}

fn serialize_payload(payload: &CommandOutcome<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\
             \"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
