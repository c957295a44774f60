//! Workflow repository: the submission and decision entrypoints.
//!
//! Submission freezes the currency conversion, selects the governing
//! rule, and creates the approval steps in one transaction with the
//! draft → waiting transition. A decision is a conditional single-row
//! update followed by a synchronous re-evaluation of the workflow, all
//! under a row lock on the owning expense.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use spesa_core::workflow::{
    ApprovalRule, ApproverContext, ApproverRef, Decision, ExpenseStatus, RuleMatcher, RulePolicy,
    RuleType, StatusEvaluator, StepSnapshot, StepStatus, UserRole, WorkflowBuilder, WorkflowError,
};
use spesa_shared::notify::{Notifier, WorkflowEvent};

use crate::entities::{approval_rules, approval_steps, companies, expenses, sea_orm_active_enums};
use crate::repositories::approval_rule::{rule_type_to_core, rule_type_to_db, to_domain};
use crate::repositories::audit::AuditRepository;
use crate::repositories::directory::{DirectoryError, DirectoryRepository};
use crate::repositories::rate_cache::CurrencyConverter;

/// Input for the submission entrypoint.
#[derive(Debug, Clone)]
pub struct SubmissionInput {
    /// The draft expense being submitted.
    pub expense_id: Uuid,
    /// The company the expense belongs to.
    pub company_id: Uuid,
    /// Expense category (drives rule matching).
    pub category: String,
    /// Amount in the original currency.
    pub original_amount: Decimal,
    /// Currency the expense was incurred in.
    pub original_currency: String,
    /// The submitting user.
    pub submitter_id: Uuid,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// Status after submission (waiting, or approved when no steps).
    pub status: ExpenseStatus,
    /// The frozen converted amount.
    pub converted_amount: Decimal,
    /// The frozen conversion rate.
    pub rate: Decimal,
    /// How many approval steps were created.
    pub steps_created: usize,
}

/// Input for the decision entrypoint.
#[derive(Debug, Clone)]
pub struct DecisionInput {
    /// The step being decided.
    pub step_id: Uuid,
    /// The user making the decision.
    pub actor_id: Uuid,
    /// Approve or reject.
    pub decision: Decision,
    /// Optional comments from the approver.
    pub comments: Option<String>,
}

/// Result of a successful decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionOutcome {
    /// The step's status after the decision.
    pub step_status: StepStatus,
    /// The expense's status after re-evaluation.
    pub expense_status: ExpenseStatus,
}

/// Workflow repository driving submissions and decisions.
#[derive(Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
    converter: CurrencyConverter,
    directory: DirectoryRepository,
    audit: AuditRepository,
    notifier: Arc<dyn Notifier>,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        converter: CurrencyConverter,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let directory = DirectoryRepository::new(db.clone());
        let audit = AuditRepository::new(db.clone());
        Self {
            db,
            converter,
            directory,
            audit,
            notifier,
        }
    }

    /// Submits a draft expense into its approval workflow.
    ///
    /// Runs the currency freeze, rule selection, and step creation as one
    /// unit of work: any failure leaves the expense in draft with zero
    /// steps persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expense is missing, not the submitter's, or not a draft
    /// - No exchange rate is available (`RateUnavailable`, retryable)
    /// - The governing rule is misconfigured (`InvalidRuleConfig`)
    /// - A database operation fails
    #[allow(clippy::too_many_lines)]
    pub async fn submit_expense(
        &self,
        input: SubmissionInput,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        if input.original_amount <= Decimal::ZERO {
            return Err(WorkflowError::InvalidAmount(input.original_amount));
        }

        let expense = expenses::Entity::find_by_id(input.expense_id)
            .filter(expenses::Column::CompanyId.eq(input.company_id))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::ExpenseNotFound(input.expense_id))?;

        if expense.submitter_id != input.submitter_id {
            return Err(WorkflowError::NotSubmitter {
                expense_id: expense.id,
                actor_id: input.submitter_id,
            });
        }

        let current_status = expense_status_to_core(&expense.status);
        if current_status != ExpenseStatus::Draft {
            return Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: ExpenseStatus::WaitingApproval,
            });
        }

        let company = companies::Entity::find_by_id(input.company_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::CompanyNotFound(input.company_id))?;

        // Freeze the conversion before any state change; a failed fetch
        // leaves the expense untouched in draft.
        let conversion = self
            .converter
            .convert(
                &input.original_currency,
                &company.default_currency,
                input.original_amount,
            )
            .await?;

        let rules = self.load_active_rules(input.company_id).await?;
        let governing =
            RuleMatcher::governing_rule(&rules, &input.category, input.original_amount).cloned();

        let plans = match &governing {
            None => Vec::new(),
            Some(rule) => {
                let ctx = self.resolve_context(rule, input.submitter_id).await?;
                WorkflowBuilder::plan(rule, &ctx)?
            }
        };

        let now = Utc::now();
        let new_status = if plans.is_empty() {
            // No gate configured: absence of governance auto-approves.
            ExpenseStatus::Approved
        } else {
            ExpenseStatus::WaitingApproval
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let mut active: expenses::ActiveModel = expense.into();
        active.category = Set(input.category.clone());
        active.original_currency = Set(input.original_currency.clone());
        active.original_amount = Set(input.original_amount);
        active.converted_amount = Set(Some(conversion.converted_amount));
        active.conversion_rate = Set(Some(conversion.rate));
        active.rate_timestamp = Set(Some(conversion.timestamp.into()));
        active.status = Set(expense_status_to_db(new_status));
        active.approval_rule_id = Set(governing.as_ref().map(|r| r.id));
        active.rule_type = Set(governing.as_ref().map(|r| rule_type_to_db(r.rule_type)));
        active.threshold_percent = Set(governing.as_ref().and_then(|r| r.threshold_percent));
        active.submitted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active
            .update(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let mut created_steps = Vec::with_capacity(plans.len());
        for plan in &plans {
            let step = approval_steps::ActiveModel {
                id: Set(Uuid::new_v4()),
                expense_id: Set(input.expense_id),
                approver_id: Set(plan.approver_id),
                sequence_index: Set(plan.sequence_index),
                status: Set(sea_orm_active_enums::StepStatus::Pending),
                action_by: Set(None),
                action_at: Set(None),
                comments: Set(None),
                created_at: Set(now.into()),
            };
            let inserted = step
                .insert(&txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?;
            created_steps.push(inserted);
        }

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        // Trail and notifications are fire-and-forget: they never block
        // or roll back the committed workflow.
        if let Some(rule) = &governing {
            self.audit
                .record(
                    "expense",
                    input.expense_id,
                    "rule_applied",
                    Some(input.submitter_id),
                    json!({
                        "rule_id": rule.id,
                        "rule_type": rule.rule_type.as_str(),
                        "steps_created": created_steps.len(),
                    }),
                )
                .await;
        }
        for step in &created_steps {
            self.notifier
                .publish(WorkflowEvent::StepCreated {
                    expense_id: input.expense_id,
                    step_id: step.id,
                    approver_id: step.approver_id,
                    sequence_index: step.sequence_index,
                })
                .await;
        }
        if new_status == ExpenseStatus::Approved {
            self.audit
                .record(
                    "expense",
                    input.expense_id,
                    "approved",
                    Some(input.submitter_id),
                    json!({ "auto_approved": true }),
                )
                .await;
            self.notifier
                .publish(WorkflowEvent::Approved {
                    expense_id: input.expense_id,
                })
                .await;
        }

        Ok(SubmissionOutcome {
            status: new_status,
            converted_amount: conversion.converted_amount,
            rate: conversion.rate,
            steps_created: created_steps.len(),
        })
    }

    /// Records one approver's decision with at-most-once semantics.
    ///
    /// The pending → decided write is a conditional update guarded by
    /// "current status is pending"; under a race on the same step exactly
    /// one decision commits and the loser observes `AlreadyDecided`. The
    /// expense row is locked for the duration of the evaluation so two
    /// near-simultaneous decisions on different steps cannot commit
    /// divergent terminal statuses.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The step is missing, not the actor's, or already decided
    /// - The owning expense is no longer waiting (`WorkflowClosed`)
    /// - A database operation fails
    pub async fn decide_step(&self, input: DecisionInput) -> Result<DecisionOutcome, WorkflowError> {
        let step = approval_steps::Entity::find_by_id(input.step_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::StepNotFound(input.step_id))?;

        if step.approver_id != input.actor_id {
            return Err(WorkflowError::Unauthorized {
                step_id: step.id,
                actor_id: input.actor_id,
            });
        }
        if step.status != sea_orm_active_enums::StepStatus::Pending {
            return Err(WorkflowError::AlreadyDecided(step.id));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let now = Utc::now();
        let action_at: sea_orm::prelude::DateTimeWithTimeZone = now.into();
        let new_step_status = step_status_to_db(input.decision.step_status());

        // At-most-once: commits only if the step is still pending. Under
        // a race on the same step exactly one of these writes sticks; the
        // loser sees zero rows regardless of what else happened to the
        // workflow in the meantime.
        let update = approval_steps::Entity::update_many()
            .col_expr(approval_steps::Column::Status, new_step_status.as_enum())
            .col_expr(
                approval_steps::Column::ActionBy,
                Expr::value(Some(input.actor_id)),
            )
            .col_expr(
                approval_steps::Column::ActionAt,
                Expr::value(Some(action_at)),
            )
            .col_expr(
                approval_steps::Column::Comments,
                Expr::value(input.comments.clone()),
            )
            .filter(approval_steps::Column::Id.eq(input.step_id))
            .filter(approval_steps::Column::Status.eq(sea_orm_active_enums::StepStatus::Pending))
            .exec(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        if update.rows_affected == 0 {
            // Lost the race to a concurrent decision.
            return Err(WorkflowError::AlreadyDecided(input.step_id));
        }

        // Row lock on the expense: single logical writer per workflow.
        // A dropped transaction rolls back automatically, including the
        // step write above.
        let expense = expenses::Entity::find_by_id(step.expense_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::ExpenseNotFound(step.expense_id))?;

        let expense_status = expense_status_to_core(&expense.status);
        if expense_status != ExpenseStatus::WaitingApproval {
            // A concurrent decision settled the workflow first; terminal
            // status is never overwritten, so this decision is voided.
            return Err(WorkflowError::WorkflowClosed {
                expense_id: expense.id,
                status: expense_status,
            });
        }

        let steps = approval_steps::Entity::find()
            .filter(approval_steps::Column::ExpenseId.eq(expense.id))
            .order_by_asc(approval_steps::Column::SequenceIndex)
            .all(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let policy = rule_policy_of(&expense).ok_or_else(|| {
            WorkflowError::Database(format!(
                "expense {} has steps but no frozen rule policy",
                expense.id
            ))
        })?;

        let snapshots = steps_to_snapshots(&steps);
        let next_status = StatusEvaluator::evaluate(policy, &snapshots);

        let expense_id = expense.id;
        if next_status != ExpenseStatus::WaitingApproval {
            let mut active: expenses::ActiveModel = expense.into();
            active.status = Set(expense_status_to_db(next_status));
            active.updated_at = Set(now.into());
            active
                .update(&txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let action = match input.decision {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        };
        self.audit
            .record(
                "approval_step",
                input.step_id,
                action,
                Some(input.actor_id),
                json!({
                    "expense_id": expense_id,
                    "sequence_index": step.sequence_index,
                    "comments": input.comments,
                }),
            )
            .await;

        match next_status {
            ExpenseStatus::Approved => {
                self.audit
                    .record(
                        "expense",
                        expense_id,
                        "approved",
                        Some(input.actor_id),
                        json!({ "settled_by_step": input.step_id }),
                    )
                    .await;
                self.notifier
                    .publish(WorkflowEvent::Approved { expense_id })
                    .await;
            }
            ExpenseStatus::Rejected => {
                self.audit
                    .record(
                        "expense",
                        expense_id,
                        "rejected",
                        Some(input.actor_id),
                        json!({ "settled_by_step": input.step_id }),
                    )
                    .await;
                self.notifier
                    .publish(WorkflowEvent::Rejected { expense_id })
                    .await;
            }
            _ => {}
        }

        Ok(DecisionOutcome {
            step_status: input.decision.step_status(),
            expense_status: next_status,
        })
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    /// Loads the company's active rules as matcher snapshots.
    async fn load_active_rules(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<ApprovalRule>, WorkflowError> {
        let rules = approval_rules::Entity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .filter(approval_rules::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(rules.iter().map(to_domain).collect())
    }

    /// Resolves the approver context the rule type needs.
    async fn resolve_context(
        &self,
        rule: &ApprovalRule,
        submitter_id: Uuid,
    ) -> Result<ApproverContext, WorkflowError> {
        let mut ctx = ApproverContext::default();
        match rule.rule_type {
            RuleType::Sequential => {
                ctx.manager_chain = self.directory.manager_chain_of(submitter_id).await?;
            }
            RuleType::Parallel | RuleType::Percentage => {
                ctx.eligible_approvers = self.cohort_of(rule.company_id, submitter_id).await?;
            }
            RuleType::Specific => {
                ctx.specific_approver = self.specific_ref(rule).await?;
            }
            RuleType::Hybrid => {
                ctx.specific_approver = self.specific_ref(rule).await?;
                ctx.eligible_approvers = self.cohort_of(rule.company_id, submitter_id).await?;
            }
        }
        Ok(ctx)
    }

    /// Active manager/admin roster of the company, minus the submitter.
    async fn cohort_of(
        &self,
        company_id: Uuid,
        submitter_id: Uuid,
    ) -> Result<Vec<Uuid>, WorkflowError> {
        let roster = self
            .directory
            .roster_of(company_id, &[UserRole::Manager, UserRole::Admin])
            .await?;
        Ok(roster
            .into_iter()
            .map(|u| u.id)
            .filter(|id| *id != submitter_id)
            .collect())
    }

    async fn specific_ref(
        &self,
        rule: &ApprovalRule,
    ) -> Result<Option<ApproverRef>, WorkflowError> {
        match rule.specific_approver_id {
            None => Ok(None),
            Some(approver_id) => Ok(self.directory.approver_ref(approver_id).await?),
        }
    }
}

impl From<DirectoryError> for WorkflowError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::UserNotFound(id) => Self::UserNotFound(id),
            DirectoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Converts a database expense status to the core enum.
#[must_use]
pub fn expense_status_to_core(status: &sea_orm_active_enums::ExpenseStatus) -> ExpenseStatus {
    match status {
        sea_orm_active_enums::ExpenseStatus::Draft => ExpenseStatus::Draft,
        sea_orm_active_enums::ExpenseStatus::WaitingApproval => ExpenseStatus::WaitingApproval,
        sea_orm_active_enums::ExpenseStatus::Approved => ExpenseStatus::Approved,
        sea_orm_active_enums::ExpenseStatus::Rejected => ExpenseStatus::Rejected,
    }
}

/// Converts a core expense status to the database enum.
#[must_use]
pub fn expense_status_to_db(status: ExpenseStatus) -> sea_orm_active_enums::ExpenseStatus {
    match status {
        ExpenseStatus::Draft => sea_orm_active_enums::ExpenseStatus::Draft,
        ExpenseStatus::WaitingApproval => sea_orm_active_enums::ExpenseStatus::WaitingApproval,
        ExpenseStatus::Approved => sea_orm_active_enums::ExpenseStatus::Approved,
        ExpenseStatus::Rejected => sea_orm_active_enums::ExpenseStatus::Rejected,
    }
}

/// Converts a database step status to the core enum.
#[must_use]
pub fn step_status_to_core(status: &sea_orm_active_enums::StepStatus) -> StepStatus {
    match status {
        sea_orm_active_enums::StepStatus::Pending => StepStatus::Pending,
        sea_orm_active_enums::StepStatus::Approved => StepStatus::Approved,
        sea_orm_active_enums::StepStatus::Rejected => StepStatus::Rejected,
    }
}

/// Converts a core step status to the database enum.
#[must_use]
pub fn step_status_to_db(status: StepStatus) -> sea_orm_active_enums::StepStatus {
    match status {
        StepStatus::Pending => sea_orm_active_enums::StepStatus::Pending,
        StepStatus::Approved => sea_orm_active_enums::StepStatus::Approved,
        StepStatus::Rejected => sea_orm_active_enums::StepStatus::Rejected,
    }
}

/// Maps persisted step rows into the evaluator's snapshot type.
#[must_use]
pub fn steps_to_snapshots(steps: &[approval_steps::Model]) -> Vec<StepSnapshot> {
    steps
        .iter()
        .map(|s| StepSnapshot {
            approver_id: s.approver_id,
            sequence_index: s.sequence_index,
            status: step_status_to_core(&s.status),
        })
        .collect()
}

/// Reads the frozen rule policy off an expense, if one was matched.
#[must_use]
pub fn rule_policy_of(expense: &expenses::Model) -> Option<RulePolicy> {
    expense.rule_type.as_ref().map(|rule_type| RulePolicy {
        rule_type: rule_type_to_core(rule_type),
        threshold_percent: expense.threshold_percent,
    })
}
