// Core engine exports
pub mod engine;
pub mod error;
pub mod global;
pub mod intimacy;
pub mod ledger;
pub mod likes;
pub mod matcher;
pub mod probability;

pub use engine::{IntimacyEngine, EngineSettings, GlobalSource};
pub use error::{EngineError, Operation};
pub use global::{scan_global_intimacy, GlobalTally};
pub use intimacy::{relationship_intimacy, account_total_intimacy, relationship_intimacy_with};
pub use ledger::LedgerReader;
pub use likes::resolve_likes;
pub use matcher::resolve_matches;
pub use probability::{intimacy_percentage, ZeroTotalPolicy};
