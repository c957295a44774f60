//! Expense approval workflow for Spesa.
//!
//! This module implements the expense lifecycle state machine, the
//! approval-rule matcher, the workflow builder, and the status evaluator.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (statuses, rules, step snapshots)
//! - `error` - Workflow-specific error types
//! - `matcher` - Governing-rule selection
//! - `builder` - Step planning per rule type
//! - `evaluator` - Pure state machine deriving overall workflow status

pub mod builder;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod types;

#[cfg(test)]
mod evaluator_props;
#[cfg(test)]
mod matcher_props;

pub use builder::WorkflowBuilder;
pub use error::WorkflowError;
pub use evaluator::StatusEvaluator;
pub use matcher::RuleMatcher;
pub use types::{
    ApprovalRule, ApproverContext, ApproverRef, Decision, ExpenseStatus, RulePolicy, RuleType,
    StepPlan, StepSnapshot, StepStatus, UserRole,
};
