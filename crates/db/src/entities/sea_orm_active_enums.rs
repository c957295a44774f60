//! `SeaORM` active enums mapped to Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense status in the approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_status")]
pub enum ExpenseStatus {
    /// Expense is being drafted.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Expense is waiting on approval steps.
    #[sea_orm(string_value = "waiting_approval")]
    WaitingApproval,
    /// Expense has been approved (terminal).
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Expense has been rejected (terminal).
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Status of a single approval step.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "step_status")]
pub enum StepStatus {
    /// Waiting on the approver.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved by the approver.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected by the approver.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// The kind of workflow an approval rule generates.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "rule_type")]
pub enum RuleType {
    /// Manager chain, in order.
    #[sea_orm(string_value = "sequential")]
    Sequential,
    /// Whole cohort at once, majority threshold.
    #[sea_orm(string_value = "parallel")]
    Parallel,
    /// Whole cohort at once, configured threshold.
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// One designated approver.
    #[sea_orm(string_value = "specific")]
    Specific,
    /// Designated approver plus cohort.
    #[sea_orm(string_value = "hybrid")]
    Hybrid,
}

/// User role within a company.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Submits expenses.
    #[sea_orm(string_value = "employee")]
    Employee,
    /// Approves expenses and manages a team.
    #[sea_orm(string_value = "manager")]
    Manager,
    /// Full administrative access.
    #[sea_orm(string_value = "admin")]
    Admin,
}
