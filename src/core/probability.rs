use serde::Deserialize;

use crate::core::error::{EngineError, Operation};

/// What to report when the global intimacy total is zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroTotalPolicy {
    /// Fail with `DivisionUndefined`
    #[default]
    Error,
    /// Report a probability of 0
    Zero,
}

/// Share of the global intimacy total held by one account, as a percentage
///
/// Never returns NaN or infinity: a zero denominator is resolved by `policy`.
pub fn intimacy_percentage(
    account_id: &str,
    account_total: f64,
    global_total: f64,
    policy: ZeroTotalPolicy,
) -> Result<f64, EngineError> {
    if global_total == 0.0 {
        return match policy {
            ZeroTotalPolicy::Error => Err(EngineError::DivisionUndefined {
                account_id: account_id.to_string(),
                operation: Operation::TodayProbability,
            }),
            ZeroTotalPolicy::Zero => Ok(0.0),
        };
    }

    Ok(account_total / global_total * 100.0)
}
