pub mod config;
pub mod domain;
pub mod errors;

pub use domain::inventory::{InventoryRecord, ItemId};
pub use domain::operation::{validate, OperationKind, OperationRequest, RawOperationRequest};
pub use domain::outcome::{FailureReason, OperationOutcome};
pub use domain::summary::{should_list_inventory, Classification, FinalSummary};
pub use errors::{ApplicationError, ValidationError};
