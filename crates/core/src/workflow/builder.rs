//! Step planning for a matched approval rule.
//!
//! The builder is pure: it expands a rule plus a resolved approver
//! context into the step plans the repository persists, all in the same
//! transaction that submits the expense.

use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ApprovalRule, ApproverContext, ApproverRef, RuleType, StepPlan};

/// Stateless planner expanding a rule into approval steps.
pub struct WorkflowBuilder;

impl WorkflowBuilder {
    /// Plans the approval steps for `rule` given the resolved context.
    ///
    /// - Sequential: one step per manager in the chain, ordered by chain
    ///   position. An empty chain plans zero steps (auto-approve).
    /// - Parallel / Percentage: the whole eligible cohort at index 0.
    /// - Specific: a single step for the designated approver.
    /// - Hybrid: the designated approver at index 0 plus the cohort at
    ///   index 1, with the designated approver deduplicated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRuleConfig` when a specific/hybrid rule names no
    /// approver, an inactive one, or one from another company.
    pub fn plan(
        rule: &ApprovalRule,
        ctx: &ApproverContext,
    ) -> Result<Vec<StepPlan>, WorkflowError> {
        match rule.rule_type {
            RuleType::Sequential => Ok(Self::chain_plans(&ctx.manager_chain)),
            RuleType::Parallel | RuleType::Percentage => {
                Ok(Self::cohort_plans(&ctx.eligible_approvers, 0))
            }
            RuleType::Specific => Self::specific_plan(rule, ctx).map(|plan| vec![plan]),
            RuleType::Hybrid => Self::hybrid_plans(rule, ctx),
        }
    }

    fn chain_plans(manager_chain: &[Uuid]) -> Vec<StepPlan> {
        manager_chain
            .iter()
            .zip(0i32..)
            .map(|(&approver_id, sequence_index)| StepPlan {
                approver_id,
                sequence_index,
            })
            .collect()
    }

    fn cohort_plans(approvers: &[Uuid], sequence_index: i32) -> Vec<StepPlan> {
        approvers
            .iter()
            .map(|&approver_id| StepPlan {
                approver_id,
                sequence_index,
            })
            .collect()
    }

    fn specific_plan(
        rule: &ApprovalRule,
        ctx: &ApproverContext,
    ) -> Result<StepPlan, WorkflowError> {
        let approver = Self::validated_specific_approver(rule, ctx)?;
        Ok(StepPlan {
            approver_id: approver.id,
            sequence_index: 0,
        })
    }

    fn hybrid_plans(
        rule: &ApprovalRule,
        ctx: &ApproverContext,
    ) -> Result<Vec<StepPlan>, WorkflowError> {
        let specific = Self::specific_plan(rule, ctx)?;
        let mut plans = vec![specific];
        plans.extend(
            ctx.eligible_approvers
                .iter()
                .filter(|&&id| id != specific.approver_id)
                .map(|&approver_id| StepPlan {
                    approver_id,
                    sequence_index: 1,
                }),
        );
        Ok(plans)
    }

    fn validated_specific_approver(
        rule: &ApprovalRule,
        ctx: &ApproverContext,
    ) -> Result<ApproverRef, WorkflowError> {
        if rule.specific_approver_id.is_none() {
            return Err(WorkflowError::InvalidRuleConfig {
                rule_id: rule.id,
                reason: "no designated approver configured".to_string(),
            });
        }

        let approver = ctx
            .specific_approver
            .ok_or_else(|| WorkflowError::InvalidRuleConfig {
                rule_id: rule.id,
                reason: "designated approver does not exist".to_string(),
            })?;

        if !approver.is_active {
            return Err(WorkflowError::InvalidRuleConfig {
                rule_id: rule.id,
                reason: "designated approver is inactive".to_string(),
            });
        }

        if approver.company_id != rule.company_id {
            return Err(WorkflowError::InvalidRuleConfig {
                rule_id: rule.id,
                reason: "designated approver belongs to another company".to_string(),
            });
        }

        Ok(approver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rule_of(rule_type: RuleType, company_id: Uuid) -> ApprovalRule {
        ApprovalRule {
            id: Uuid::new_v4(),
            company_id,
            name: "test rule".to_string(),
            rule_type,
            threshold_percent: None,
            specific_approver_id: None,
            applies_to_category: None,
            min_amount: None,
            max_amount: None,
            priority: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sequential_indices_follow_chain_order() {
        let chain = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let ctx = ApproverContext {
            manager_chain: chain.clone(),
            ..ApproverContext::default()
        };

        let plans =
            WorkflowBuilder::plan(&rule_of(RuleType::Sequential, Uuid::new_v4()), &ctx).unwrap();
        assert_eq!(plans.len(), 3);
        for (i, plan) in plans.iter().enumerate() {
            assert_eq!(plan.approver_id, chain[i]);
            assert_eq!(plan.sequence_index, i32::try_from(i).unwrap());
        }
    }

    #[test]
    fn test_sequential_empty_chain_plans_nothing() {
        let ctx = ApproverContext::default();
        let plans =
            WorkflowBuilder::plan(&rule_of(RuleType::Sequential, Uuid::new_v4()), &ctx).unwrap();
        assert!(plans.is_empty());
    }

    #[test]
    fn test_parallel_cohort_all_at_index_zero() {
        let cohort = vec![Uuid::new_v4(), Uuid::new_v4()];
        let ctx = ApproverContext {
            eligible_approvers: cohort.clone(),
            ..ApproverContext::default()
        };

        for rule_type in [RuleType::Parallel, RuleType::Percentage] {
            let plans = WorkflowBuilder::plan(&rule_of(rule_type, Uuid::new_v4()), &ctx).unwrap();
            assert_eq!(plans.len(), 2);
            assert!(plans.iter().all(|p| p.sequence_index == 0));
        }
    }

    #[test]
    fn test_specific_single_step() {
        let company_id = Uuid::new_v4();
        let approver_id = Uuid::new_v4();
        let mut rule = rule_of(RuleType::Specific, company_id);
        rule.specific_approver_id = Some(approver_id);
        let ctx = ApproverContext {
            specific_approver: Some(ApproverRef {
                id: approver_id,
                company_id,
                is_active: true,
            }),
            ..ApproverContext::default()
        };

        let plans = WorkflowBuilder::plan(&rule, &ctx).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].approver_id, approver_id);
        assert_eq!(plans[0].sequence_index, 0);
    }

    #[test]
    fn test_specific_unset_approver_is_misconfigured() {
        let rule = rule_of(RuleType::Specific, Uuid::new_v4());
        let result = WorkflowBuilder::plan(&rule, &ApproverContext::default());
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidRuleConfig { .. })
        ));
    }

    #[test]
    fn test_specific_inactive_approver_is_misconfigured() {
        let company_id = Uuid::new_v4();
        let approver_id = Uuid::new_v4();
        let mut rule = rule_of(RuleType::Specific, company_id);
        rule.specific_approver_id = Some(approver_id);
        let ctx = ApproverContext {
            specific_approver: Some(ApproverRef {
                id: approver_id,
                company_id,
                is_active: false,
            }),
            ..ApproverContext::default()
        };

        let result = WorkflowBuilder::plan(&rule, &ctx);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidRuleConfig { .. })
        ));
    }

    #[test]
    fn test_specific_cross_company_approver_is_misconfigured() {
        let approver_id = Uuid::new_v4();
        let mut rule = rule_of(RuleType::Specific, Uuid::new_v4());
        rule.specific_approver_id = Some(approver_id);
        let ctx = ApproverContext {
            specific_approver: Some(ApproverRef {
                id: approver_id,
                company_id: Uuid::new_v4(), // different company
                is_active: true,
            }),
            ..ApproverContext::default()
        };

        let result = WorkflowBuilder::plan(&rule, &ctx);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidRuleConfig { .. })
        ));
    }

    #[test]
    fn test_hybrid_dedups_specific_approver_from_cohort() {
        let company_id = Uuid::new_v4();
        let specific_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();
        let mut rule = rule_of(RuleType::Hybrid, company_id);
        rule.specific_approver_id = Some(specific_id);
        let ctx = ApproverContext {
            eligible_approvers: vec![specific_id, other_id],
            specific_approver: Some(ApproverRef {
                id: specific_id,
                company_id,
                is_active: true,
            }),
            ..ApproverContext::default()
        };

        let plans = WorkflowBuilder::plan(&rule, &ctx).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].approver_id, specific_id);
        assert_eq!(plans[0].sequence_index, 0);
        assert_eq!(plans[1].approver_id, other_id);
        assert_eq!(plans[1].sequence_index, 1);
    }
}
