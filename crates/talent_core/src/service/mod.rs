//! Caller-side use cases that own transactions.
//!
//! # Responsibility
//! - Begin a transaction, bind repositories to it, commit or roll back.
//! - Keep repositories free of transaction lifecycle decisions.

pub mod talent_service;
