use std::fmt;
use thiserror::Error;

use crate::services::StoreError;

/// Engine operation an error occurred in, carried for caller-side logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadLedger,
    FindAccount,
    TotalIntimacy,
    RelationshipIntimacy,
    GlobalIntimacy,
    TodayProbability,
    ResolveMatches,
    ResolveLikes,
    HeadlineScore,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ReadLedger => "read_ledger",
            Operation::FindAccount => "find_account",
            Operation::TotalIntimacy => "total_intimacy",
            Operation::RelationshipIntimacy => "relationship_intimacy",
            Operation::GlobalIntimacy => "global_intimacy",
            Operation::TodayProbability => "today_probability",
            Operation::ResolveMatches => "resolve_matches",
            Operation::ResolveLikes => "resolve_likes",
            Operation::HeadlineScore => "headline_score",
        };
        f.write_str(name)
    }
}

/// Errors produced by the intimacy engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{operation}: account not found: {account_id}")]
    NotFound {
        account_id: String,
        operation: Operation,
    },

    #[error("{operation}: data inconsistency for account {account_id}: {detail}")]
    DataInconsistency {
        account_id: String,
        operation: Operation,
        detail: String,
    },

    #[error("{operation}: malformed ledger for account {account_id}: {detail}")]
    AggregationError {
        account_id: String,
        operation: Operation,
        detail: String,
    },

    #[error("{operation}: global intimacy total is zero, probability for account {account_id} is undefined")]
    DivisionUndefined {
        account_id: String,
        operation: Operation,
    },

    #[error("{operation}: account store error: {source}")]
    Store {
        operation: Operation,
        #[source]
        source: StoreError,
    },
}

impl EngineError {
    pub fn not_found(account_id: impl Into<String>, operation: Operation) -> Self {
        EngineError::NotFound {
            account_id: account_id.into(),
            operation,
        }
    }

    pub fn inconsistency(
        account_id: impl Into<String>,
        operation: Operation,
        detail: impl Into<String>,
    ) -> Self {
        EngineError::DataInconsistency {
            account_id: account_id.into(),
            operation,
            detail: detail.into(),
        }
    }

    pub fn malformed(
        account_id: impl Into<String>,
        operation: Operation,
        detail: impl Into<String>,
    ) -> Self {
        EngineError::AggregationError {
            account_id: account_id.into(),
            operation,
            detail: detail.into(),
        }
    }

    /// Adapter for `map_err` on store calls
    ///
    /// An undecodable account document is a malformed ledger, not a backend
    /// failure.
    pub fn store(operation: Operation) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::MalformedDocument { account_id, detail } => EngineError::AggregationError {
                account_id,
                operation,
                detail,
            },
            source => EngineError::Store { operation, source },
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            EngineError::NotFound { operation, .. }
            | EngineError::DataInconsistency { operation, .. }
            | EngineError::AggregationError { operation, .. }
            | EngineError::DivisionUndefined { operation, .. }
            | EngineError::Store { operation, .. } => *operation,
        }
    }

    /// Short machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "not_found",
            EngineError::DataInconsistency { .. } => "data_inconsistency",
            EngineError::AggregationError { .. } => "aggregation_error",
            EngineError::DivisionUndefined { .. } => "division_undefined",
            EngineError::Store { .. } => "store_error",
        }
    }
}
