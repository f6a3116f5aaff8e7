use thiserror::Error;

use crate::domain::operation::OperationKind;

/// Rejections raised before a request can reach the store.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid operation `{0}`. Use 'create', 'update', or 'delete'.")]
    UnknownOperation(String),
    #[error("missing required field(s) for {kind}: {}.", .fields.join(", "))]
    MissingField { kind: OperationKind, fields: Vec<&'static str> },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("model collaborator failure: {0}")]
    Collaborator(String),
    #[error("runtime failure: {0}")]
    Runtime(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "config_validation",
            Self::Persistence(_) => "db_connectivity",
            Self::Collaborator(_) => "collaborator",
            Self::Runtime(_) => "runtime_init",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => {
                "Configuration is invalid. Check stockroom.toml and STOCKROOM_* variables."
            }
            Self::Persistence(_) => "The inventory store is unavailable.",
            Self::Collaborator(_) => {
                "The language model could not be reached. The request was not completed."
            }
            Self::Runtime(_) => "An unexpected internal error occurred.",
        }
    }
}
