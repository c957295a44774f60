//! `SeaORM` Entity for the expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ExpenseStatus, RuleType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub submitter_id: Uuid,
    pub category: String,
    pub description: Option<String>,
    pub original_currency: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub original_amount: Decimal,
    /// Frozen at submission; never recomputed.
    #[sea_orm(column_type = "Decimal(Some((18, 2)))", nullable)]
    pub converted_amount: Option<Decimal>,
    /// Frozen at submission; never recomputed.
    #[sea_orm(column_type = "Decimal(Some((18, 8)))", nullable)]
    pub conversion_rate: Option<Decimal>,
    /// Frozen at submission; never recomputed.
    pub rate_timestamp: Option<DateTimeWithTimeZone>,
    pub status: ExpenseStatus,
    /// The governing rule at submission time, if any matched.
    pub approval_rule_id: Option<Uuid>,
    /// Rule policy snapshot: later rule edits never touch this.
    pub rule_type: Option<RuleType>,
    /// Rule policy snapshot: later rule edits never touch this.
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub threshold_percent: Option<Decimal>,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubmitterId",
        to = "super::users::Column::Id"
    )]
    Submitter,
    #[sea_orm(
        belongs_to = "super::approval_rules::Entity",
        from = "Column::ApprovalRuleId",
        to = "super::approval_rules::Column::Id"
    )]
    ApprovalRules,
    #[sea_orm(has_many = "super::approval_steps::Entity")]
    ApprovalSteps,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::approval_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalSteps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
