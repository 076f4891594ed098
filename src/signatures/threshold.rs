//! Threshold flag recomputation
//!
//! `threshold_met` is a cache of `signature_count >= signature_threshold`,
//! recomputed only when a signature is recorded or withdrawn. Each function
//! returns the value to write, or `None` when the flag is left untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison applied after a withdrawal.
///
/// The recording path always sets the flag when `count >= threshold`. The
/// withdrawal path historically cleared it whenever `count != threshold`,
/// which wrongly clears a question whose count still exceeds a lowered
/// threshold. Which comparison is correct is a product decision, so both are
/// selectable and `NotEqual` stays the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WithdrawalRule {
    /// Clear the flag when `count != threshold`
    #[default]
    NotEqual,
    /// Clear the flag when `count < threshold`
    BelowThreshold,
}

impl fmt::Display for WithdrawalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEqual => write!(f, "not-equal"),
            Self::BelowThreshold => write!(f, "below-threshold"),
        }
    }
}

impl FromStr for WithdrawalRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "not-equal" | "not_equal" => Ok(Self::NotEqual),
            "below-threshold" | "below_threshold" => Ok(Self::BelowThreshold),
            other => Err(format!(
                "unknown withdrawal rule '{other}' (expected not-equal or below-threshold)"
            )),
        }
    }
}

/// Flag to write after a signature is recorded
pub fn flag_after_signing(count: i64, threshold: i64) -> Option<bool> {
    (count >= threshold).then_some(true)
}

/// Flag to write after a signature is withdrawn
pub fn flag_after_withdrawal(rule: WithdrawalRule, count: i64, threshold: i64) -> Option<bool> {
    let clear = match rule {
        WithdrawalRule::NotEqual => count != threshold,
        WithdrawalRule::BelowThreshold => count < threshold,
    };
    clear.then_some(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_sets_flag_at_or_above_threshold() {
        assert_eq!(flag_after_signing(2, 3), None);
        assert_eq!(flag_after_signing(3, 3), Some(true));
        assert_eq!(flag_after_signing(4, 3), Some(true));
    }

    #[test]
    fn test_withdrawal_not_equal() {
        assert_eq!(flag_after_withdrawal(WithdrawalRule::NotEqual, 2, 3), Some(false));
        assert_eq!(flag_after_withdrawal(WithdrawalRule::NotEqual, 3, 3), None);
        // Count above threshold is still cleared under this rule
        assert_eq!(flag_after_withdrawal(WithdrawalRule::NotEqual, 5, 3), Some(false));
    }

    #[test]
    fn test_withdrawal_below_threshold() {
        assert_eq!(flag_after_withdrawal(WithdrawalRule::BelowThreshold, 2, 3), Some(false));
        assert_eq!(flag_after_withdrawal(WithdrawalRule::BelowThreshold, 3, 3), None);
        assert_eq!(flag_after_withdrawal(WithdrawalRule::BelowThreshold, 5, 3), None);
    }

    #[test]
    fn test_rule_parsing() {
        assert_eq!("not-equal".parse::<WithdrawalRule>(), Ok(WithdrawalRule::NotEqual));
        assert_eq!(
            "BELOW_THRESHOLD".parse::<WithdrawalRule>(),
            Ok(WithdrawalRule::BelowThreshold)
        );
        assert!("greater".parse::<WithdrawalRule>().is_err());
        assert_eq!(WithdrawalRule::default().to_string(), "not-equal");
    }
}
