use crate::core::error::{EngineError, Operation};
use crate::core::ledger::ledger_of;
use crate::models::{Account, Relationship};

/// Sum of every contact event's delta in one relationship
///
/// An empty history sums to 0. No sign constraint is applied.
#[inline]
pub fn relationship_intimacy(relationship: &Relationship) -> f64 {
    relationship
        .contact_events
        .iter()
        .map(|event| event.intimacy_delta)
        .sum()
}

/// Sum of [`relationship_intimacy`] over every relationship of an account
///
/// Always walks the ledger as it is now; there is no stored total to trust.
pub fn account_total_intimacy(account: &Account) -> Result<f64, EngineError> {
    let ledger = ledger_of(account, Operation::TotalIntimacy)?;
    Ok(ledger.iter().map(relationship_intimacy).sum())
}

/// Locate the relationship an account holds with `counterpart_id`
///
/// The ledger should hold at most one entry per counterpart, but that is not
/// enforced by the writers. When duplicates exist the first in ledger order
/// wins.
pub fn find_relationship<'a>(
    account: &'a Account,
    counterpart_id: &str,
    operation: Operation,
) -> Result<Option<&'a Relationship>, EngineError> {
    let ledger = ledger_of(account, operation)?;
    let mut matching = ledger.iter().filter(|r| r.counterpart_id == counterpart_id);

    let first = matching.next();
    let duplicates = matching.count();
    if duplicates > 0 {
        tracing::warn!(
            "Account {} holds {} relationships with {}, using the first",
            account.id,
            duplicates + 1,
            counterpart_id
        );
    }

    Ok(first)
}

/// Intimacy of `account`'s own relationship with `counterpart_id`
///
/// Fails with `DataInconsistency` when the account has no such relationship.
pub fn relationship_intimacy_with(
    account: &Account,
    counterpart_id: &str,
    operation: Operation,
) -> Result<f64, EngineError> {
    find_relationship(account, counterpart_id, operation)?
        .map(relationship_intimacy)
        .ok_or_else(|| {
            EngineError::inconsistency(
                &account.id,
                operation,
                format!("no relationship with {}", counterpart_id),
            )
        })
}
