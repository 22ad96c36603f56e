use crate::core::error::{EngineError, Operation};
use crate::core::intimacy::relationship_intimacy_with;
use crate::core::ledger::LedgerReader;
use crate::models::MatchCandidate;

/// Expand an account's matching list into enriched candidate records
///
/// # Resolution
/// For each candidate id, in list order:
/// 1. The candidate account is resolved (`NotFound` aborts the call)
/// 2. The requester's own relationship with the candidate is located
///    (`DataInconsistency` aborts the call when there is none)
/// 3. That relationship's contact deltas are summed
///
/// The score is always the requester's view of the relationship, never the
/// candidate's aggregate. No partial result is ever returned.
pub async fn resolve_matches(
    reader: &LedgerReader,
    account_id: &str,
) -> Result<Vec<MatchCandidate>, EngineError> {
    const OP: Operation = Operation::ResolveMatches;

    let requester = reader.account(account_id, OP).await?;
    let mut candidates = Vec::with_capacity(requester.matching_list.len());

    for candidate_id in &requester.matching_list {
        let candidate = reader.counterpart(candidate_id, OP).await?;
        let intimacy_score = relationship_intimacy_with(&requester, &candidate.id, OP)?;

        candidates.push(MatchCandidate {
            candidate_id: candidate.id,
            name: candidate.name,
            phone_number: candidate.phone_number,
            intimacy_score,
        });
    }

    Ok(candidates)
}
