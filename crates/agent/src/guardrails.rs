use stockroom_core::config::AgentConfig;

/// Budget checkpoints taken by the runtime before each model round and tool call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardrailCheck {
    ModelRound { completed_rounds: u32 },
    ToolInvocation { completed_invocations: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, user_message: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub max_tool_invocations: u32,
    pub max_model_rounds: u32,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { max_tool_invocations: 8, max_model_rounds: 10 }
    }
}

impl From<&AgentConfig> for GuardrailPolicy {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_tool_invocations: config.max_tool_invocations,
            max_model_rounds: config.max_model_rounds,
        }
    }
}

impl GuardrailPolicy {
    pub fn evaluate(&self, check: &GuardrailCheck) -> GuardrailDecision {
        match *check {
            GuardrailCheck::ModelRound { completed_rounds }
                if completed_rounds >= self.max_model_rounds =>
            {
                GuardrailDecision::Deny {
                    reason_code: "model_round_budget_exhausted",
                    user_message: format!(
                        "The model did not produce a final summary within {} rounds.",
                        self.max_model_rounds
                    ),
                }
            }
            GuardrailCheck::ToolInvocation { completed_invocations }
                if completed_invocations >= self.max_tool_invocations =>
            {
                GuardrailDecision::Deny {
                    reason_code: "tool_invocation_budget_exhausted",
                    user_message: format!(
                        "The request needed more than {} inventory operations.",
                        self.max_tool_invocations
                    ),
                }
            }
            GuardrailCheck::ModelRound { .. } | GuardrailCheck::ToolInvocation { .. } => {
                GuardrailDecision::Allow
            }
        }
    }
}
