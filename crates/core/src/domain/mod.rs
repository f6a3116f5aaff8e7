pub mod inventory;
pub mod operation;
pub mod outcome;
pub mod summary;
