//! Workflow error types for the expense approval lifecycle.
//!
//! This module defines all error types that can occur during submission
//! and step decisions, plus the mapping into the application-wide error.

use thiserror::Error;
use uuid::Uuid;

use crate::workflow::types::ExpenseStatus;
use rust_decimal::Decimal;
use spesa_shared::AppError;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ExpenseStatus,
        /// The attempted target status.
        to: ExpenseStatus,
    },

    /// The governing rule is malformed and cannot produce steps.
    #[error("Approval rule {rule_id} is misconfigured: {reason}")]
    InvalidRuleConfig {
        /// The offending rule.
        rule_id: Uuid,
        /// What is wrong with it.
        reason: String,
    },

    /// The submitted amount is not positive.
    #[error("Expense amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// No usable exchange rate for the currency pair.
    ///
    /// Submission aborts and the expense stays in draft; retrying the
    /// whole call is safe.
    #[error("No exchange rate available for {from}/{to}")]
    RateUnavailable {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
    },

    /// The actor does not own the step they tried to decide.
    #[error("User {actor_id} is not the approver of step {step_id}")]
    Unauthorized {
        /// The step being decided.
        step_id: Uuid,
        /// The user who attempted the decision.
        actor_id: Uuid,
    },

    /// The step was already decided (possibly by a racing request).
    #[error("Step {0} has already been decided")]
    AlreadyDecided(Uuid),

    /// The owning expense is no longer accepting decisions.
    #[error("Expense {expense_id} workflow is closed (status {status})")]
    WorkflowClosed {
        /// The owning expense.
        expense_id: Uuid,
        /// Its current status.
        status: ExpenseStatus,
    },

    /// The actor is not the submitter of the draft they tried to touch.
    #[error("User {actor_id} is not the submitter of expense {expense_id}")]
    NotSubmitter {
        /// The expense being modified.
        expense_id: Uuid,
        /// The user who attempted the modification.
        actor_id: Uuid,
    },

    /// Expense not found.
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Approval step not found.
    #[error("Approval step {0} not found")]
    StepNotFound(Uuid),

    /// Company not found.
    #[error("Company {0} not found")]
    CompanyNotFound(Uuid),

    /// User not found.
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::InvalidRuleConfig { .. } | WorkflowError::InvalidAmount(_) => {
                Self::Validation(err.to_string())
            }
            WorkflowError::InvalidTransition { .. } | WorkflowError::WorkflowClosed { .. } => {
                Self::BusinessRule(err.to_string())
            }
            WorkflowError::AlreadyDecided(_) => Self::Conflict(err.to_string()),
            WorkflowError::Unauthorized { .. } | WorkflowError::NotSubmitter { .. } => {
                Self::Forbidden(err.to_string())
            }
            WorkflowError::ExpenseNotFound(_)
            | WorkflowError::StepNotFound(_)
            | WorkflowError::CompanyNotFound(_)
            | WorkflowError::UserNotFound(_) => Self::NotFound(err.to_string()),
            WorkflowError::RateUnavailable { .. } => Self::ExternalService(err.to_string()),
            WorkflowError::Database(msg) => Self::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let err = WorkflowError::InvalidTransition {
            from: ExpenseStatus::Approved,
            to: ExpenseStatus::WaitingApproval,
        };
        assert!(err.to_string().contains("approved"));
        assert!(err.to_string().contains("waiting_approval"));
    }

    #[test]
    fn test_rate_unavailable_display() {
        let err = WorkflowError::RateUnavailable {
            from: "EUR".to_string(),
            to: "USD".to_string(),
        };
        assert!(err.to_string().contains("EUR/USD"));
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = WorkflowError::AlreadyDecided(Uuid::nil()).into();
        assert_eq!(err.error_code(), "CONFLICT");

        let err: AppError = WorkflowError::Unauthorized {
            step_id: Uuid::nil(),
            actor_id: Uuid::nil(),
        }
        .into();
        assert_eq!(err.error_code(), "FORBIDDEN");

        let err: AppError = WorkflowError::RateUnavailable {
            from: "EUR".to_string(),
            to: "USD".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "EXTERNAL_SERVICE_ERROR");
        assert!(err.is_retryable());

        let err: AppError = WorkflowError::ExpenseNotFound(Uuid::nil()).into();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err: AppError = WorkflowError::InvalidRuleConfig {
            rule_id: Uuid::nil(),
            reason: "no designated approver".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
