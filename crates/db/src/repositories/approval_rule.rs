//! Approval rule repository.
//!
//! Provides CRUD operations for approval rules. Rules are admin-managed
//! and independent of in-flight workflows: editing or deleting a rule
//! never mutates already-created steps, because submissions freeze a
//! policy snapshot onto the expense.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use thiserror::Error;
use uuid::Uuid;

use spesa_core::workflow::{ApprovalRule, RuleType};

use crate::entities::{
    approval_rules::{self, ActiveModel, Entity as ApprovalRuleEntity, Model as ApprovalRuleModel},
    sea_orm_active_enums,
};

/// Errors that can occur during approval rule operations.
#[derive(Debug, Error)]
pub enum ApprovalRuleError {
    /// Approval rule not found.
    #[error("Approval rule {0} not found")]
    NotFound(Uuid),

    /// A percentage rule needs a threshold.
    #[error("Percentage rules require a threshold")]
    MissingThreshold,

    /// Threshold must lie in [0, 100].
    #[error("Threshold {0} is out of range (0-100)")]
    ThresholdOutOfRange(Decimal),

    /// A specific/hybrid rule needs a designated approver.
    #[error("Specific and hybrid rules require a designated approver")]
    MissingApprover,

    /// Amount bounds must form a valid range.
    #[error("Minimum amount {min} exceeds maximum amount {max}")]
    InvertedAmountBounds {
        /// Configured minimum.
        min: Decimal,
        /// Configured maximum.
        max: Decimal,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Input for creating an approval rule.
#[derive(Debug, Clone)]
pub struct CreateApprovalRuleInput {
    /// Name of the approval rule.
    pub name: String,
    /// The kind of workflow the rule generates.
    pub rule_type: RuleType,
    /// Approval threshold in percent (percentage/hybrid rules).
    pub threshold_percent: Option<Decimal>,
    /// Designated approver (specific/hybrid rules).
    pub specific_approver_id: Option<Uuid>,
    /// Restrict the rule to one expense category.
    pub applies_to_category: Option<String>,
    /// Minimum amount threshold (inclusive).
    pub min_amount: Option<Decimal>,
    /// Maximum amount threshold (inclusive).
    pub max_amount: Option<Decimal>,
    /// Priority (higher wins).
    pub priority: i16,
}

/// Input for updating an approval rule.
#[derive(Debug, Clone, Default)]
pub struct UpdateApprovalRuleInput {
    /// New name.
    pub name: Option<String>,
    /// New threshold.
    pub threshold_percent: Option<Option<Decimal>>,
    /// New designated approver.
    pub specific_approver_id: Option<Option<Uuid>>,
    /// New category restriction.
    pub applies_to_category: Option<Option<String>>,
    /// New minimum amount.
    pub min_amount: Option<Option<Decimal>>,
    /// New maximum amount.
    pub max_amount: Option<Option<Decimal>>,
    /// New priority.
    pub priority: Option<i16>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// Repository for approval rule operations.
#[derive(Debug, Clone)]
pub struct ApprovalRuleRepository {
    db: DatabaseConnection,
}

impl ApprovalRuleRepository {
    /// Creates a new approval rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new approval rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the insert
    /// fails.
    pub async fn create_rule(
        &self,
        company_id: Uuid,
        input: CreateApprovalRuleInput,
    ) -> Result<ApprovalRuleModel, ApprovalRuleError> {
        validate_config(
            input.rule_type,
            input.threshold_percent,
            input.specific_approver_id,
            input.min_amount,
            input.max_amount,
        )?;

        let now = chrono::Utc::now().into();
        let rule = ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(input.name),
            rule_type: Set(rule_type_to_db(input.rule_type)),
            threshold_percent: Set(input.threshold_percent),
            specific_approver_id: Set(input.specific_approver_id),
            applies_to_category: Set(input.applies_to_category),
            min_amount: Set(input.min_amount),
            max_amount: Set(input.max_amount),
            priority: Set(input.priority),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = rule.insert(&self.db).await?;
        Ok(result)
    }

    /// Lists all active approval rules for a company, ranked the way the
    /// matcher ranks them.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_rules(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<ApprovalRuleModel>, ApprovalRuleError> {
        let rules = ApprovalRuleEntity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .filter(approval_rules::Column::IsActive.eq(true))
            .order_by_desc(approval_rules::Column::Priority)
            .order_by_asc(approval_rules::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rules)
    }

    /// Gets a specific approval rule by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule does not exist or the query fails.
    pub async fn get_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
    ) -> Result<ApprovalRuleModel, ApprovalRuleError> {
        let rule = ApprovalRuleEntity::find_by_id(rule_id)
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?
            .ok_or(ApprovalRuleError::NotFound(rule_id))?;

        Ok(rule)
    }

    /// Updates an approval rule.
    ///
    /// In-flight workflows are unaffected: their expenses carry a frozen
    /// policy snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule does not exist, the resulting
    /// configuration is invalid, or the update fails.
    pub async fn update_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
        input: UpdateApprovalRuleInput,
    ) -> Result<ApprovalRuleModel, ApprovalRuleError> {
        let existing = self.get_rule(company_id, rule_id).await?;

        let rule_type = rule_type_to_core(&existing.rule_type);
        let threshold = input
            .threshold_percent
            .unwrap_or(existing.threshold_percent);
        let specific = input
            .specific_approver_id
            .unwrap_or(existing.specific_approver_id);
        let min_amount = input.min_amount.unwrap_or(existing.min_amount);
        let max_amount = input.max_amount.unwrap_or(existing.max_amount);
        validate_config(rule_type, threshold, specific, min_amount, max_amount)?;

        let mut rule: ActiveModel = existing.into();

        if let Some(name) = input.name {
            rule.name = Set(name);
        }
        if let Some(threshold_percent) = input.threshold_percent {
            rule.threshold_percent = Set(threshold_percent);
        }
        if let Some(specific_approver_id) = input.specific_approver_id {
            rule.specific_approver_id = Set(specific_approver_id);
        }
        if let Some(applies_to_category) = input.applies_to_category {
            rule.applies_to_category = Set(applies_to_category);
        }
        if let Some(min_amount) = input.min_amount {
            rule.min_amount = Set(min_amount);
        }
        if let Some(max_amount) = input.max_amount {
            rule.max_amount = Set(max_amount);
        }
        if let Some(priority) = input.priority {
            rule.priority = Set(priority);
        }
        if let Some(is_active) = input.is_active {
            rule.is_active = Set(is_active);
        }

        rule.updated_at = Set(chrono::Utc::now().into());

        let result = rule.update(&self.db).await?;
        Ok(result)
    }

    /// Soft deletes an approval rule by setting `is_active` to false.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule does not exist or the update fails.
    pub async fn delete_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
    ) -> Result<(), ApprovalRuleError> {
        let existing = self.get_rule(company_id, rule_id).await?;

        let mut rule: ActiveModel = existing.into();
        rule.is_active = Set(false);
        rule.updated_at = Set(chrono::Utc::now().into());

        rule.update(&self.db).await?;
        Ok(())
    }

    /// Snapshots the company's active rules for the matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn active_rules_snapshot(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<ApprovalRule>, ApprovalRuleError> {
        let rules = self.list_rules(company_id).await?;
        Ok(rules.iter().map(to_domain).collect())
    }
}

/// Validates a rule configuration before it is persisted.
///
/// # Errors
///
/// Returns the specific misconfiguration found.
pub fn validate_config(
    rule_type: RuleType,
    threshold_percent: Option<Decimal>,
    specific_approver_id: Option<Uuid>,
    min_amount: Option<Decimal>,
    max_amount: Option<Decimal>,
) -> Result<(), ApprovalRuleError> {
    if let Some(threshold) = threshold_percent {
        if threshold < Decimal::ZERO || threshold > Decimal::ONE_HUNDRED {
            return Err(ApprovalRuleError::ThresholdOutOfRange(threshold));
        }
    }

    if rule_type == RuleType::Percentage && threshold_percent.is_none() {
        return Err(ApprovalRuleError::MissingThreshold);
    }

    if matches!(rule_type, RuleType::Specific | RuleType::Hybrid)
        && specific_approver_id.is_none()
    {
        return Err(ApprovalRuleError::MissingApprover);
    }

    if let (Some(min), Some(max)) = (min_amount, max_amount) {
        if min > max {
            return Err(ApprovalRuleError::InvertedAmountBounds { min, max });
        }
    }

    Ok(())
}

/// Converts a stored rule row into the core snapshot type.
#[must_use]
pub fn to_domain(model: &ApprovalRuleModel) -> ApprovalRule {
    ApprovalRule {
        id: model.id,
        company_id: model.company_id,
        name: model.name.clone(),
        rule_type: rule_type_to_core(&model.rule_type),
        threshold_percent: model.threshold_percent,
        specific_approver_id: model.specific_approver_id,
        applies_to_category: model.applies_to_category.clone(),
        min_amount: model.min_amount,
        max_amount: model.max_amount,
        priority: model.priority,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&chrono::Utc),
    }
}

/// Converts a core rule type to the database enum.
#[must_use]
pub fn rule_type_to_db(rule_type: RuleType) -> sea_orm_active_enums::RuleType {
    match rule_type {
        RuleType::Sequential => sea_orm_active_enums::RuleType::Sequential,
        RuleType::Parallel => sea_orm_active_enums::RuleType::Parallel,
        RuleType::Percentage => sea_orm_active_enums::RuleType::Percentage,
        RuleType::Specific => sea_orm_active_enums::RuleType::Specific,
        RuleType::Hybrid => sea_orm_active_enums::RuleType::Hybrid,
    }
}

/// Converts a database rule type to the core enum.
#[must_use]
pub fn rule_type_to_core(rule_type: &sea_orm_active_enums::RuleType) -> RuleType {
    match rule_type {
        sea_orm_active_enums::RuleType::Sequential => RuleType::Sequential,
        sea_orm_active_enums::RuleType::Parallel => RuleType::Parallel,
        sea_orm_active_enums::RuleType::Percentage => RuleType::Percentage,
        sea_orm_active_enums::RuleType::Specific => RuleType::Specific,
        sea_orm_active_enums::RuleType::Hybrid => RuleType::Hybrid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rule_type_mapping_round_trip() {
        for rule_type in [
            RuleType::Sequential,
            RuleType::Parallel,
            RuleType::Percentage,
            RuleType::Specific,
            RuleType::Hybrid,
        ] {
            assert_eq!(rule_type_to_core(&rule_type_to_db(rule_type)), rule_type);
        }
    }

    #[test]
    fn test_percentage_requires_threshold() {
        let result = validate_config(RuleType::Percentage, None, None, None, None);
        assert!(matches!(result, Err(ApprovalRuleError::MissingThreshold)));

        let result = validate_config(RuleType::Percentage, Some(dec!(60)), None, None, None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_threshold_range() {
        let result = validate_config(RuleType::Percentage, Some(dec!(101)), None, None, None);
        assert!(matches!(
            result,
            Err(ApprovalRuleError::ThresholdOutOfRange(_))
        ));

        let result = validate_config(RuleType::Percentage, Some(dec!(-1)), None, None, None);
        assert!(matches!(
            result,
            Err(ApprovalRuleError::ThresholdOutOfRange(_))
        ));

        assert!(validate_config(RuleType::Percentage, Some(dec!(0)), None, None, None).is_ok());
        assert!(validate_config(RuleType::Percentage, Some(dec!(100)), None, None, None).is_ok());
    }

    #[test]
    fn test_specific_and_hybrid_require_approver() {
        for rule_type in [RuleType::Specific, RuleType::Hybrid] {
            let result = validate_config(rule_type, None, None, None, None);
            assert!(matches!(result, Err(ApprovalRuleError::MissingApprover)));

            let result = validate_config(rule_type, None, Some(Uuid::new_v4()), None, None);
            assert!(result.is_ok());
        }
    }

    #[test]
    fn test_amount_bounds_must_be_ordered() {
        let result = validate_config(
            RuleType::Sequential,
            None,
            None,
            Some(dec!(500)),
            Some(dec!(100)),
        );
        assert!(matches!(
            result,
            Err(ApprovalRuleError::InvertedAmountBounds { .. })
        ));

        let result = validate_config(
            RuleType::Sequential,
            None,
            None,
            Some(dec!(100)),
            Some(dec!(500)),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = ApprovalRuleError::NotFound(Uuid::new_v4());
        assert!(err.to_string().contains("not found"));

        let err = ApprovalRuleError::MissingThreshold;
        assert!(err.to_string().contains("threshold"));
    }
}
