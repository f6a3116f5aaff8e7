use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::domain::summary::FinalSummary;

use crate::conversation::{ConversationContext, ToolCall};

/// What the collaborator wants next.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelStep {
    ToolCalls(Vec<ToolCall>),
    Final(FinalSummary),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("model transport failed: {0}")]
    Transport(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response was malformed: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait ModelCollaborator: Send + Sync {
    fn name(&self) -> &str;
    async fn submit(&self, context: &ConversationContext) -> Result<ModelStep, CollaboratorError>;
}

/// Replays a fixed script of steps and records every context it was handed.
#[derive(Default)]
pub struct ScriptedCollaborator {
    steps: Mutex<VecDeque<Result<ModelStep, CollaboratorError>>>,
    seen: Mutex<Vec<ConversationContext>>,
}

impl ScriptedCollaborator {
    pub fn new(steps: Vec<Result<ModelStep, CollaboratorError>>) -> Self {
        Self { steps: Mutex::new(steps.into()), seen: Mutex::new(Vec::new()) }
    }

    pub fn seen_contexts(&self) -> Vec<ConversationContext> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.lock().map(|steps| steps.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelCollaborator for ScriptedCollaborator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit(&self, context: &ConversationContext) -> Result<ModelStep, CollaboratorError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(context.clone());
        }

        let next = self
            .steps
            .lock()
            .map_err(|_| CollaboratorError::Transport("script lock poisoned".to_string()))?
            .pop_front();

        next.unwrap_or_else(|| {
            Err(CollaboratorError::MalformedResponse(
                "scripted collaborator ran out of steps".to_string(),
            ))
        })
    }
}
