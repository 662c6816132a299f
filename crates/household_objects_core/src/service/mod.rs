//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into catalog-level convenience APIs.
//! - Keep callers decoupled from storage details.

pub mod objects_database;
