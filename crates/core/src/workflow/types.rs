//! Workflow domain types for the expense approval lifecycle.
//!
//! This module defines the core types used for managing expense status
//! transitions, approval rules, and step planning.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Expense status in the approval workflow.
///
/// Expenses progress through these states from creation to settlement.
/// The valid transitions are:
/// - Draft → WaitingApproval (submit, steps created)
/// - Draft → Approved (submit with zero governing steps)
/// - WaitingApproval → Approved (workflow settles)
/// - WaitingApproval → Rejected (workflow settles)
///
/// Approved and Rejected are terminal; transitions never reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Expense is being drafted and can be modified by its submitter.
    Draft,
    /// Expense has been submitted and is waiting on approval steps.
    WaitingApproval,
    /// Expense has been approved (immutable).
    Approved,
    /// Expense has been rejected (immutable).
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::WaitingApproval => "waiting_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "waiting_approval" => Some(Self::WaitingApproval),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the expense can still be modified by its submitter.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Returns true if moving from `self` to `to` is a valid forward
    /// transition.
    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (
                Self::Draft,
                Self::WaitingApproval | Self::Approved
            ) | (
                Self::WaitingApproval,
                Self::Approved | Self::Rejected
            )
        )
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single approval step.
///
/// A step transitions Pending → {Approved, Rejected} exactly once and
/// never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Waiting on the approver's decision.
    Pending,
    /// The approver approved.
    Approved,
    /// The approver rejected.
    Rejected,
}

impl StepStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the step has been decided.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An approver's verdict on a pending step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the step.
    Approve,
    /// Reject the step.
    Reject,
}

impl Decision {
    /// The step status this decision resolves to.
    #[must_use]
    pub fn step_status(&self) -> StepStatus {
        match self {
            Self::Approve => StepStatus::Approved,
            Self::Reject => StepStatus::Rejected,
        }
    }
}

/// The kind of approval workflow a rule generates.
///
/// A closed sum type: every variant has exactly one handler in the
/// builder and the evaluator, so a new kind cannot be added without the
/// compiler pointing at every site that must handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Walk the submitter's manager chain in order.
    Sequential,
    /// Every eligible approver at once; majority threshold settles.
    Parallel,
    /// Every eligible approver at once; configured threshold settles.
    Percentage,
    /// A single designated approver.
    Specific,
    /// A designated approver who can settle instantly, plus a cohort.
    Hybrid,
}

impl RuleType {
    /// Returns the string representation of the rule type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Percentage => "percentage",
            Self::Specific => "specific",
            Self::Hybrid => "hybrid",
        }
    }

    /// Parses a rule type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequential" => Some(Self::Sequential),
            "parallel" => Some(Self::Parallel),
            "percentage" => Some(Self::Percentage),
            "specific" => Some(Self::Specific),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User role in the company.
///
/// Roles are ordered from lowest to highest privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Submits expenses.
    Employee = 0,
    /// Approves expenses and manages a team.
    Manager = 1,
    /// Full administrative access, including rule management.
    Admin = 2,
}

impl UserRole {
    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Returns true if the role can be placed on an approval step cohort.
    #[must_use]
    pub fn is_approver(&self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

/// An approval rule as configured by a company admin.
///
/// The matcher and builder consume a point-in-time snapshot of these;
/// editing or deleting a rule never mutates already-created steps.
#[derive(Debug, Clone)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: Uuid,
    /// Company the rule belongs to.
    pub company_id: Uuid,
    /// Human-readable name for the rule.
    pub name: String,
    /// The kind of workflow this rule generates.
    pub rule_type: RuleType,
    /// Approval threshold in percent (percentage/hybrid rules).
    pub threshold_percent: Option<Decimal>,
    /// The designated approver (specific/hybrid rules).
    pub specific_approver_id: Option<Uuid>,
    /// Restrict the rule to one expense category (None = any).
    pub applies_to_category: Option<String>,
    /// Minimum amount for this rule to apply (inclusive, None = no minimum).
    pub min_amount: Option<Decimal>,
    /// Maximum amount for this rule to apply (inclusive, None = no maximum).
    pub max_amount: Option<Decimal>,
    /// Priority for rule selection (higher wins; ties go to the oldest).
    pub priority: i16,
    /// Whether the rule participates in matching.
    pub is_active: bool,
    /// When the rule was created (tie-break for equal priorities).
    pub created_at: DateTime<Utc>,
}

/// The evaluation policy frozen onto an expense at submission.
///
/// Carrying this snapshot on the expense is what keeps in-flight
/// workflows immune to later rule edits or deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulePolicy {
    /// The kind of workflow governing the expense.
    pub rule_type: RuleType,
    /// Approval threshold in percent, when the rule carried one.
    pub threshold_percent: Option<Decimal>,
}

impl RulePolicy {
    /// The threshold to evaluate against, defaulting to 50 percent.
    #[must_use]
    pub fn threshold_or_default(&self) -> Decimal {
        self.threshold_percent.unwrap_or_else(|| Decimal::from(50))
    }
}

/// One planned approval step, not yet persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    /// The approver who will own the step.
    pub approver_id: Uuid,
    /// Ordinal position for sequential rules; grouping tag otherwise.
    pub sequence_index: i32,
}

/// Immutable view of one persisted step, as consumed by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSnapshot {
    /// The approver who owns the step.
    pub approver_id: Uuid,
    /// Ordinal position for sequential rules; grouping tag otherwise.
    pub sequence_index: i32,
    /// Current status of the step.
    pub status: StepStatus,
}

/// Reference data about a candidate approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproverRef {
    /// The user's identifier.
    pub id: Uuid,
    /// The company the user belongs to.
    pub company_id: Uuid,
    /// Whether the user is active.
    pub is_active: bool,
}

/// Resolved approver context consumed by the workflow builder.
///
/// The directory resolver fills in only the fields the rule type needs.
#[derive(Debug, Clone, Default)]
pub struct ApproverContext {
    /// The submitter's manager chain, walked upward (active users only).
    pub manager_chain: Vec<Uuid>,
    /// Active manager/admin roster of the company, excluding the submitter.
    pub eligible_approvers: Vec<Uuid>,
    /// The designated approver, when the rule names one.
    pub specific_approver: Option<ApproverRef>,
}
