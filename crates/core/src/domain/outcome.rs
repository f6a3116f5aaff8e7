use std::fmt;

use crate::domain::inventory::ItemId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    NotFound(ItemId),
    StoreError(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Item with ID {id} not found."),
            Self::StoreError(message) => f.write_str(message),
        }
    }
}

/// Result of attempting one operation against the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationOutcome {
    Success(String),
    Failure(FailureReason),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Text handed back to the model collaborator.
impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(message) => f.write_str(message),
            Self::Failure(reason) => write!(f, "Error: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::inventory::ItemId;

    use super::{FailureReason, OperationOutcome};

    #[test]
    fn not_found_renders_error_text() {
        let outcome = OperationOutcome::Failure(FailureReason::NotFound(ItemId(2)));
        assert_eq!(outcome.to_string(), "Error: Item with ID 2 not found.");
        assert!(!outcome.is_success());
    }

    #[test]
    fn success_renders_message_verbatim() {
        let outcome = OperationOutcome::Success("Deleted item ID 1.".to_string());
        assert_eq!(outcome.to_string(), "Deleted item ID 1.");
    }
}
