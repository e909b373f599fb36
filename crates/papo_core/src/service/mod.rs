//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the gateway layer decoupled from storage details.
//!
//! # Invariants
//! - Every balance change, direct or automated, flows through
//!   `TransactionService::execute`, so one atomicity discipline covers
//!   all of them.

pub mod bonk_service;
pub mod capture_service;
pub mod transaction_service;
