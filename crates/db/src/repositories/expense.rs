//! Expense draft repository.
//!
//! An expense is created as a draft by its submitter and stays mutable
//! only for that submitter while it remains a draft. Submission itself
//! is handled by the workflow repository.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use thiserror::Error;
use uuid::Uuid;

use spesa_core::workflow::ExpenseStatus;

use crate::entities::{approval_steps, expenses, sea_orm_active_enums};
use crate::repositories::workflow::expense_status_to_core;

/// Errors that can occur during draft operations.
#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Expense not found.
    #[error("Expense {0} not found")]
    NotFound(Uuid),

    /// Only the submitter may modify their draft.
    #[error("User {actor_id} is not the submitter of expense {expense_id}")]
    NotSubmitter {
        /// The expense being modified.
        expense_id: Uuid,
        /// The user who attempted the modification.
        actor_id: Uuid,
    },

    /// The expense has left the draft state.
    #[error("Expense {expense_id} is no longer editable (status {status})")]
    NotEditable {
        /// The expense being modified.
        expense_id: Uuid,
        /// Its current status.
        status: ExpenseStatus,
    },

    /// The amount is not positive.
    #[error("Expense amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a draft expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Company the expense belongs to.
    pub company_id: Uuid,
    /// The submitting user.
    pub submitter_id: Uuid,
    /// Expense category.
    pub category: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Currency the expense was incurred in.
    pub original_currency: String,
    /// Amount in the original currency.
    pub original_amount: Decimal,
}

/// Input for updating a draft expense.
#[derive(Debug, Clone, Default)]
pub struct UpdateDraftInput {
    /// New category.
    pub category: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New currency.
    pub original_currency: Option<String>,
    /// New amount.
    pub original_amount: Option<Decimal>,
}

/// Expense repository for draft CRUD.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft expense.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive or the insert
    /// fails.
    pub async fn create_draft(
        &self,
        input: CreateExpenseInput,
    ) -> Result<expenses::Model, ExpenseError> {
        if input.original_amount <= Decimal::ZERO {
            return Err(ExpenseError::InvalidAmount(input.original_amount));
        }

        let now = chrono::Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            submitter_id: Set(input.submitter_id),
            category: Set(input.category),
            description: Set(input.description),
            original_currency: Set(input.original_currency),
            original_amount: Set(input.original_amount),
            converted_amount: Set(None),
            conversion_rate: Set(None),
            rate_timestamp: Set(None),
            status: Set(sea_orm_active_enums::ExpenseStatus::Draft),
            approval_rule_id: Set(None),
            rule_type: Set(None),
            threshold_percent: Set(None),
            submitted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = expense.insert(&self.db).await?;
        Ok(result)
    }

    /// Updates a draft expense.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense does not exist, the actor is not
    /// its submitter, or it has left the draft state.
    pub async fn update_draft(
        &self,
        expense_id: Uuid,
        actor_id: Uuid,
        input: UpdateDraftInput,
    ) -> Result<expenses::Model, ExpenseError> {
        let expense = expenses::Entity::find_by_id(expense_id)
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;

        if expense.submitter_id != actor_id {
            return Err(ExpenseError::NotSubmitter {
                expense_id,
                actor_id,
            });
        }

        let status = expense_status_to_core(&expense.status);
        if !status.is_editable() {
            return Err(ExpenseError::NotEditable { expense_id, status });
        }

        if let Some(amount) = input.original_amount {
            if amount <= Decimal::ZERO {
                return Err(ExpenseError::InvalidAmount(amount));
            }
        }

        let mut active: expenses::ActiveModel = expense.into();
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(original_currency) = input.original_currency {
            active.original_currency = Set(original_currency);
        }
        if let Some(original_amount) = input.original_amount {
            active.original_amount = Set(original_amount);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let result = active.update(&self.db).await?;
        Ok(result)
    }

    /// Finds an expense by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, expense_id: Uuid) -> Result<Option<expenses::Model>, DbErr> {
        expenses::Entity::find_by_id(expense_id).one(&self.db).await
    }

    /// Fetches an expense together with its steps, ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn find_with_steps(
        &self,
        expense_id: Uuid,
    ) -> Result<Option<(expenses::Model, Vec<approval_steps::Model>)>, DbErr> {
        let Some(expense) = expenses::Entity::find_by_id(expense_id).one(&self.db).await? else {
            return Ok(None);
        };

        let steps = approval_steps::Entity::find()
            .filter(approval_steps::Column::ExpenseId.eq(expense_id))
            .order_by_asc(approval_steps::Column::SequenceIndex)
            .order_by_asc(approval_steps::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(Some((expense, steps)))
    }
}
