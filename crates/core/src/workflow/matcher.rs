//! Governing-rule selection for submitted expenses.
//!
//! At most one rule governs a workflow: the highest-priority active rule
//! whose category and amount bounds admit the expense. Absence of any
//! match means no gate is required and the expense auto-approves.

use rust_decimal::Decimal;

use crate::workflow::types::ApprovalRule;

/// Stateless selector for the governing approval rule.
pub struct RuleMatcher;

impl RuleMatcher {
    /// Selects the single governing rule for an expense context.
    ///
    /// Candidates are active rules whose `applies_to_category` is unset or
    /// equals the expense category and whose `[min_amount, max_amount]`
    /// range (both bounds optional, inclusive) admits the amount. The
    /// highest priority wins; ties go to the earliest-created rule.
    ///
    /// Returns `None` when no rule matches.
    #[must_use]
    pub fn governing_rule<'a>(
        rules: &'a [ApprovalRule],
        category: &str,
        amount: Decimal,
    ) -> Option<&'a ApprovalRule> {
        let mut candidates: Vec<&ApprovalRule> = rules
            .iter()
            .filter(|r| r.is_active)
            .filter(|r| {
                r.applies_to_category
                    .as_deref()
                    .is_none_or(|c| c == category)
            })
            .filter(|r| {
                let above_min = r.min_amount.is_none_or(|min| amount >= min);
                let below_max = r.max_amount.is_none_or(|max| amount <= max);
                above_min && below_max
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        candidates.first().copied()
    }
}
