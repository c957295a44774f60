//! The workflow state machine.
//!
//! A pure function from the frozen rule policy and the full current step
//! snapshot to the overall expense status. No hidden mutable state: the
//! caller reads the committed snapshot, evaluates, and persists the
//! result in the same unit of work.

use rust_decimal::Decimal;

use crate::workflow::types::{ExpenseStatus, RulePolicy, RuleType, StepSnapshot, StepStatus};

/// Stateless evaluator deriving overall workflow status from step state.
pub struct StatusEvaluator;

impl StatusEvaluator {
    /// Derives the expense status from the step snapshot.
    ///
    /// Any rejected step settles the workflow as rejected regardless of
    /// rule type. Zero steps settle as approved (no gate configured).
    #[must_use]
    pub fn evaluate(policy: RulePolicy, steps: &[StepSnapshot]) -> ExpenseStatus {
        if steps.is_empty() {
            return ExpenseStatus::Approved;
        }

        if steps.iter().any(|s| s.status == StepStatus::Rejected) {
            return ExpenseStatus::Rejected;
        }

        match policy.rule_type {
            RuleType::Sequential => Self::sequential(steps),
            RuleType::Parallel | RuleType::Percentage => {
                let approved = Self::approved_count(steps);
                Self::threshold_outcome(policy.threshold_or_default(), approved, steps.len())
            }
            RuleType::Specific => {
                if steps.iter().any(|s| s.status == StepStatus::Approved) {
                    ExpenseStatus::Approved
                } else {
                    ExpenseStatus::WaitingApproval
                }
            }
            RuleType::Hybrid => Self::hybrid(policy, steps),
        }
    }

    /// Scan by ascending sequence index; the first step that is not yet
    /// approved halts evaluation.
    fn sequential(steps: &[StepSnapshot]) -> ExpenseStatus {
        let mut ordered: Vec<&StepSnapshot> = steps.iter().collect();
        ordered.sort_by_key(|s| s.sequence_index);

        for step in ordered {
            if step.status != StepStatus::Approved {
                return ExpenseStatus::WaitingApproval;
            }
        }
        ExpenseStatus::Approved
    }

    /// The designated approver (index 0) settles instantly; otherwise the
    /// percentage rule runs over the remaining cohort. An empty cohort
    /// waits on the designated approver rather than vacuously approving.
    fn hybrid(policy: RulePolicy, steps: &[StepSnapshot]) -> ExpenseStatus {
        let specific_approved = steps
            .iter()
            .any(|s| s.sequence_index == 0 && s.status == StepStatus::Approved);
        if specific_approved {
            return ExpenseStatus::Approved;
        }

        let cohort: Vec<&StepSnapshot> = steps.iter().filter(|s| s.sequence_index > 0).collect();
        if cohort.is_empty() {
            return ExpenseStatus::WaitingApproval;
        }

        let approved = cohort
            .iter()
            .filter(|s| s.status == StepStatus::Approved)
            .count();
        Self::threshold_outcome(policy.threshold_or_default(), approved, cohort.len())
    }

    fn approved_count(steps: &[StepSnapshot]) -> usize {
        steps
            .iter()
            .filter(|s| s.status == StepStatus::Approved)
            .count()
    }

    /// `approved / total * 100 >= threshold`, in exact decimal arithmetic.
    fn threshold_outcome(threshold: Decimal, approved: usize, total: usize) -> ExpenseStatus {
        if total == 0 {
            return ExpenseStatus::Approved;
        }
        let reached =
            Decimal::from(approved) * Decimal::ONE_HUNDRED >= threshold * Decimal::from(total);
        if reached {
            ExpenseStatus::Approved
        } else {
            ExpenseStatus::WaitingApproval
        }
    }
}
