//! Property-based tests for bounded waits and status codes.
//! Verifies invariants hold for ALL poll budgets and codes, not just fixed examples.

#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use platform::{DisplayError, Status, WaitCondition, WaitPolicy};

proptest::proptest! {
    /// A flag that flips on poll `k` is seen iff `k` fits in the budget.
    #[test]
    fn polls_policy_succeeds_within_budget(budget in 1u32..500, k in 1u32..1000) {
        let mut polls = 0u32;
        let result = WaitPolicy::Polls(budget).wait_for(WaitCondition::VsyncActive, || {
            polls += 1;
            polls >= k
        });
        if k <= budget {
            assert!(result.is_ok());
            assert_eq!(polls, k);
        } else {
            assert_eq!(result, Err(DisplayError::Timeout(WaitCondition::VsyncActive)));
            assert_eq!(polls, budget);
        }
    }

    /// The timeout error always names the condition that was waited on.
    #[test]
    fn timeout_carries_condition(idx in 0usize..4) {
        let conditions = [
            WaitCondition::Pll3Unlocked,
            WaitCondition::Pll3Locked,
            WaitCondition::VsyncInactive,
            WaitCondition::VsyncActive,
        ];
        let cond = conditions[idx % conditions.len()];
        let result = WaitPolicy::Polls(1).wait_for(cond, || false);
        assert_eq!(result, Err(DisplayError::Timeout(cond)));
    }

    /// Only code zero is OK.
    #[test]
    fn only_zero_is_ok(code in 0u32..1000) {
        let status = Status::from_code(code);
        assert_eq!(status.is_ok(), code == 0);
        assert_eq!(status.is_err(), code != 0);
        assert_eq!(status.code(), code);
    }

    /// Display never panics and is never empty.
    #[test]
    fn status_display_is_total(code in proptest::num::u32::ANY) {
        assert!(!Status::from_code(code).to_string().is_empty());
    }
}

#[test]
fn every_timeout_maps_to_etimedout() {
    for cond in [
        WaitCondition::Pll3Unlocked,
        WaitCondition::Pll3Locked,
        WaitCondition::VsyncInactive,
        WaitCondition::VsyncActive,
    ] {
        assert_eq!(Status::from(DisplayError::Timeout(cond)), Status::ETIMEDOUT);
    }
}
