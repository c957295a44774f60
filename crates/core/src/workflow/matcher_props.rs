//! Property-based tests for the rule matcher.
//!
//! These tests validate the selection invariants: the governing rule is
//! always an admissible candidate, and ranking is total.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::matcher::RuleMatcher;
use crate::workflow::types::{ApprovalRule, RuleType};

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating expense categories.
fn arb_category() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "travel".to_string(),
        "meals".to_string(),
        "office".to_string(),
        "software".to_string(),
    ])
}

/// Strategy for generating a single rule with optional bounds.
fn arb_rule() -> impl Strategy<Value = ApprovalRule> {
    (
        any::<bool>(),
        prop::option::of(arb_category()),
        prop::option::of(0i64..500_000i64),
        prop::option::of(500_000i64..1_000_000i64),
        -10i16..10i16,
        0i64..1_000_000i64,
    )
        .prop_map(
            |(is_active, category, min_cents, max_cents, priority, created_secs)| ApprovalRule {
                id: Uuid::new_v4(),
                company_id: Uuid::nil(),
                name: "generated".to_string(),
                rule_type: RuleType::Parallel,
                threshold_percent: None,
                specific_approver_id: None,
                applies_to_category: category,
                min_amount: min_cents.map(|n| Decimal::new(n, 2)),
                max_amount: max_cents.map(|n| Decimal::new(n, 2)),
                priority,
                is_active,
                created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The governing rule is always active and admits the expense's
    /// category and amount.
    #[test]
    fn prop_governing_rule_is_admissible(
        rules in prop::collection::vec(arb_rule(), 0..12),
        category in arb_category(),
        amount in arb_amount(),
    ) {
        if let Some(rule) = RuleMatcher::governing_rule(&rules, &category, amount) {
            prop_assert!(rule.is_active);
            prop_assert!(rule
                .applies_to_category
                .as_deref()
                .is_none_or(|c| c == category));
            prop_assert!(rule.min_amount.is_none_or(|min| amount >= min));
            prop_assert!(rule.max_amount.is_none_or(|max| amount <= max));
        }
    }

    /// No admissible candidate outranks the governing rule.
    #[test]
    fn prop_governing_rule_has_top_rank(
        rules in prop::collection::vec(arb_rule(), 0..12),
        category in arb_category(),
        amount in arb_amount(),
    ) {
        if let Some(winner) = RuleMatcher::governing_rule(&rules, &category, amount) {
            for candidate in rules.iter().filter(|r| {
                r.is_active
                    && r.applies_to_category.as_deref().is_none_or(|c| c == category)
                    && r.min_amount.is_none_or(|min| amount >= min)
                    && r.max_amount.is_none_or(|max| amount <= max)
            }) {
                let outranks = candidate.priority > winner.priority
                    || (candidate.priority == winner.priority
                        && candidate.created_at < winner.created_at);
                prop_assert!(!outranks);
            }
        }
    }

    /// A fully inactive rule set never yields a governing rule.
    #[test]
    fn prop_inactive_rules_never_govern(
        rules in prop::collection::vec(arb_rule(), 0..12),
        category in arb_category(),
        amount in arb_amount(),
    ) {
        let inactive: Vec<ApprovalRule> = rules
            .into_iter()
            .map(|mut r| {
                r.is_active = false;
                r
            })
            .collect();
        prop_assert!(RuleMatcher::governing_rule(&inactive, &category, amount).is_none());
    }
}
