use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use stockroom_core::domain::summary::FinalSummary;

use crate::conversation::{ConversationContext, OPERATION_INSTRUCTIONS};
use crate::guardrails::{GuardrailCheck, GuardrailDecision, GuardrailPolicy};
use crate::llm::{CollaboratorError, ModelCollaborator, ModelStep};
use crate::tools::ToolRegistry;

/// Fatal outcomes of a run. Tool-level failures are never surfaced here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("{user_message} ({reason_code})")]
    BudgetExhausted { reason_code: &'static str, user_message: String },
}

pub struct AgentRuntime {
    collaborator: Arc<dyn ModelCollaborator>,
    tools: ToolRegistry,
    guardrails: GuardrailPolicy,
    instructions: String,
}

impl AgentRuntime {
    pub fn new(
        collaborator: Arc<dyn ModelCollaborator>,
        tools: ToolRegistry,
        guardrails: GuardrailPolicy,
    ) -> Self {
        Self { collaborator, tools, guardrails, instructions: OPERATION_INSTRUCTIONS.to_string() }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// One intent, zero or more sequential tool calls, one final summary.
    ///
    /// The summary is returned exactly as the collaborator produced it. A
    /// collaborator failure aborts the run without retry.
    pub async fn run(&self, intent: &str) -> Result<FinalSummary, AgentError> {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "agent.run.started",
            correlation_id = %correlation_id,
            collaborator = self.collaborator.name(),
            "orchestration run started"
        );

        let mut context =
            ConversationContext::new(self.instructions.clone(), intent, self.tools.definitions());
        let mut completed_rounds = 0u32;
        let mut completed_invocations = 0u32;

        loop {
            self.check(GuardrailCheck::ModelRound { completed_rounds }, &correlation_id)?;
            let step = match self.collaborator.submit(&context).await {
                Ok(step) => step,
                Err(error) => {
                    warn!(
                        event_name = "agent.run.collaborator_failed",
                        correlation_id = %correlation_id,
                        error = %error,
                        "model collaborator round trip failed"
                    );
                    return Err(error.into());
                }
            };
            completed_rounds += 1;

            let calls = match step {
                ModelStep::Final(summary) => {
                    info!(
                        event_name = "agent.run.completed",
                        correlation_id = %correlation_id,
                        classification = summary.classification.as_str(),
                        tool_invocations = completed_invocations,
                        "orchestration run completed"
                    );
                    return Ok(summary);
                }
                ModelStep::ToolCalls(calls) => calls,
            };

            context.push_tool_calls(calls.clone());
            for call in calls {
                self.check(
                    GuardrailCheck::ToolInvocation { completed_invocations },
                    &correlation_id,
                )?;
                let output = self.tools.dispatch(&call).await;
                completed_invocations += 1;

                if output.is_error {
                    warn!(
                        event_name = "agent.tool.failed",
                        correlation_id = %correlation_id,
                        tool = %call.name,
                        call_id = %call.id,
                        output = %output.content,
                        "tool invocation reported a failure"
                    );
                } else {
                    info!(
                        event_name = "agent.tool.invoked",
                        correlation_id = %correlation_id,
                        tool = %call.name,
                        call_id = %call.id,
                        output = %output.content,
                        "tool invocation succeeded"
                    );
                }
                context.push_tool_result(call.id, output.content);
            }
        }
    }

    fn check(&self, check: GuardrailCheck, correlation_id: &str) -> Result<(), AgentError> {
        match self.guardrails.evaluate(&check) {
            GuardrailDecision::Allow => Ok(()),
            GuardrailDecision::Deny { reason_code, user_message } => {
                warn!(
                    event_name = "agent.run.budget_exhausted",
                    correlation_id = %correlation_id,
                    reason_code,
                    "orchestration run stopped by guardrail"
                );
                Err(AgentError::BudgetExhausted { reason_code, user_message })
            }
        }
    }
}
