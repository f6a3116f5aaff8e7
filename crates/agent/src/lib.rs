//! Agent runtime - tool-invocation orchestration over the inventory store
//!
//! This crate sits between free-form model output and the record store:
//! - Describes the single `manage_inventory` tool to the model (`tools`)
//! - Keeps the conversation transcript fed back on every round (`conversation`)
//! - Validates and executes operation requests (`executor`)
//! - Bounds how long a single intent may run (`guardrails`)
//! - Drives the submit / dispatch / feed-back loop (`runtime`)
//!
//! # Architecture
//!
//! The model collaborator (`llm`) is opaque: it either asks for tool calls or
//! ends the run with a `FinalSummary`. Tool calls run one at a time, and their
//! outcome text is appended to the context before the next round trip.
//!
//! # Safety Principle
//!
//! The model never writes SQL. Every mutation goes through the closed
//! create/update/delete vocabulary and is validated before the store is touched.

pub mod conversation;
pub mod executor;
pub mod guardrails;
pub mod llm;
pub mod openai;
pub mod runtime;
pub mod tools;
