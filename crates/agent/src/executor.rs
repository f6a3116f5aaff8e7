use std::sync::Arc;

use tracing::warn;

use stockroom_core::domain::operation::OperationRequest;
use stockroom_core::domain::outcome::{FailureReason, OperationOutcome};
use stockroom_db::InventoryRepository;

/// Maps one validated operation onto exactly one store primitive.
#[derive(Clone)]
pub struct OperationExecutor {
    store: Arc<dyn InventoryRepository>,
}

impl OperationExecutor {
    pub fn new(store: Arc<dyn InventoryRepository>) -> Self {
        Self { store }
    }

    /// Never fails: store faults come back as `Failure(StoreError)`.
    pub async fn execute(&self, op: OperationRequest) -> OperationOutcome {
        let kind = op.kind();
        let result = match op {
            OperationRequest::Create { name, quantity } => {
                self.store.insert(&name, quantity).await.map(|record| {
                    OperationOutcome::Success(format!(
                        "Added {} with ID {} and quantity {}.",
                        record.name, record.id, record.quantity
                    ))
                })
            }
            OperationRequest::Update { id, name, quantity } => {
                self.store.update(id, &name, quantity).await.map(|affected| {
                    if affected == 0 {
                        OperationOutcome::Failure(FailureReason::NotFound(id))
                    } else {
                        OperationOutcome::Success(format!(
                            "Updated item ID {id} to {name} with quantity {quantity}."
                        ))
                    }
                })
            }
            OperationRequest::Delete { id } => self.store.delete(id).await.map(|affected| {
                if affected == 0 {
                    OperationOutcome::Failure(FailureReason::NotFound(id))
                } else {
                    OperationOutcome::Success(format!("Deleted item ID {id}."))
                }
            }),
        };

        result.unwrap_or_else(|error| {
            warn!(
                event_name = "agent.executor.store_error",
                operation = kind.as_str(),
                error = %error,
                "store rejected inventory operation"
            );
            OperationOutcome::Failure(FailureReason::StoreError(error.to_string()))
        })
    }
}
