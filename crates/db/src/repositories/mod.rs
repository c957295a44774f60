//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod approval_rule;
pub mod audit;
pub mod directory;
pub mod expense;
pub mod rate_cache;
pub mod workflow;

pub use approval_rule::{
    ApprovalRuleError, ApprovalRuleRepository, CreateApprovalRuleInput, UpdateApprovalRuleInput,
};
pub use audit::AuditRepository;
pub use directory::{DirectoryError, DirectoryRepository, MAX_CHAIN_DEPTH};
pub use expense::{CreateExpenseInput, ExpenseError, ExpenseRepository, UpdateDraftInput};
pub use rate_cache::{CurrencyConverter, ExchangeRateRepository, RateError};
pub use workflow::{
    DecisionInput, DecisionOutcome, SubmissionInput, SubmissionOutcome, WorkflowRepository,
};
