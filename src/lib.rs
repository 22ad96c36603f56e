//! Lume Intimacy - intimacy aggregation and match resolution for Lume dating app
//!
//! This library aggregates per-relationship contact scores into account and
//! global intimacy totals, derives today's match probability, and resolves
//! match and like lists into enriched records by reading each account's
//! relationship ledger from the account store.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{IntimacyEngine, EngineSettings, EngineError, relationship_intimacy, account_total_intimacy};
pub use crate::models::{Account, Relationship, ContactEvent, MatchCandidate, LikedAccounts, GlobalIntimacyReport};
pub use crate::services::{AccountStore, InMemoryAccountStore};
