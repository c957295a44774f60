//! Tests for the entity ↔ domain mapping layer and the evaluation path
//! from persisted rows to a settled status. No live database needed:
//! entity models are plain structs.

use chrono::Utc;
use rust_decimal_macros::dec;
use uuid::Uuid;

use spesa_core::workflow::{ExpenseStatus, StatusEvaluator, StepStatus};
use spesa_db::entities::{approval_steps, expenses, sea_orm_active_enums};
use spesa_db::repositories::workflow::{
    expense_status_to_core, expense_status_to_db, rule_policy_of, step_status_to_core,
    step_status_to_db, steps_to_snapshots,
};

fn step_row(
    expense_id: Uuid,
    sequence_index: i32,
    status: sea_orm_active_enums::StepStatus,
) -> approval_steps::Model {
    approval_steps::Model {
        id: Uuid::new_v4(),
        expense_id,
        approver_id: Uuid::new_v4(),
        sequence_index,
        status,
        action_by: None,
        action_at: None,
        comments: None,
        created_at: Utc::now().into(),
    }
}

fn waiting_expense(rule_type: sea_orm_active_enums::RuleType) -> expenses::Model {
    let now = Utc::now();
    expenses::Model {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        submitter_id: Uuid::new_v4(),
        category: "travel".to_string(),
        description: None,
        original_currency: "EUR".to_string(),
        original_amount: dec!(100),
        converted_amount: Some(dec!(110.00)),
        conversion_rate: Some(dec!(1.10)),
        rate_timestamp: Some(now.into()),
        status: sea_orm_active_enums::ExpenseStatus::WaitingApproval,
        approval_rule_id: Some(Uuid::new_v4()),
        rule_type: Some(rule_type),
        threshold_percent: Some(dec!(60)),
        submitted_at: Some(now.into()),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[test]
fn expense_status_round_trips() {
    for status in [
        ExpenseStatus::Draft,
        ExpenseStatus::WaitingApproval,
        ExpenseStatus::Approved,
        ExpenseStatus::Rejected,
    ] {
        assert_eq!(expense_status_to_core(&expense_status_to_db(status)), status);
    }
}

#[test]
fn step_status_round_trips() {
    for status in [
        StepStatus::Pending,
        StepStatus::Approved,
        StepStatus::Rejected,
    ] {
        assert_eq!(step_status_to_core(&step_status_to_db(status)), status);
    }
}

#[test]
fn snapshots_preserve_index_and_status() {
    let expense_id = Uuid::new_v4();
    let rows = vec![
        step_row(expense_id, 0, sea_orm_active_enums::StepStatus::Approved),
        step_row(expense_id, 1, sea_orm_active_enums::StepStatus::Pending),
        step_row(expense_id, 2, sea_orm_active_enums::StepStatus::Rejected),
    ];

    let snapshots = steps_to_snapshots(&rows);
    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].sequence_index, 0);
    assert_eq!(snapshots[0].status, StepStatus::Approved);
    assert_eq!(snapshots[1].status, StepStatus::Pending);
    assert_eq!(snapshots[2].status, StepStatus::Rejected);
    assert_eq!(snapshots[0].approver_id, rows[0].approver_id);
}

#[test]
fn draft_expense_has_no_frozen_policy() {
    let mut expense = waiting_expense(sea_orm_active_enums::RuleType::Percentage);
    expense.rule_type = None;
    expense.threshold_percent = None;
    assert!(rule_policy_of(&expense).is_none());
}

#[test]
fn frozen_policy_drives_percentage_evaluation() {
    // 60% threshold over 5 steps: 3 approvals settle, 2 do not.
    let expense = waiting_expense(sea_orm_active_enums::RuleType::Percentage);
    let policy = rule_policy_of(&expense).unwrap();

    let rows: Vec<approval_steps::Model> = (0..5)
        .map(|i| {
            step_row(
                expense.id,
                0,
                if i < 3 {
                    sea_orm_active_enums::StepStatus::Approved
                } else {
                    sea_orm_active_enums::StepStatus::Pending
                },
            )
        })
        .collect();
    assert_eq!(
        StatusEvaluator::evaluate(policy, &steps_to_snapshots(&rows)),
        ExpenseStatus::Approved
    );

    let rows: Vec<approval_steps::Model> = (0..5)
        .map(|i| {
            step_row(
                expense.id,
                0,
                if i < 2 {
                    sea_orm_active_enums::StepStatus::Approved
                } else {
                    sea_orm_active_enums::StepStatus::Pending
                },
            )
        })
        .collect();
    assert_eq!(
        StatusEvaluator::evaluate(policy, &steps_to_snapshots(&rows)),
        ExpenseStatus::WaitingApproval
    );
}

#[test]
fn frozen_policy_drives_sequential_evaluation() {
    let expense = waiting_expense(sea_orm_active_enums::RuleType::Sequential);
    let policy = rule_policy_of(&expense).unwrap();

    // Higher-index approvals do not advance a blocked chain.
    let rows = vec![
        step_row(expense.id, 0, sea_orm_active_enums::StepStatus::Pending),
        step_row(expense.id, 1, sea_orm_active_enums::StepStatus::Approved),
    ];
    assert_eq!(
        StatusEvaluator::evaluate(policy, &steps_to_snapshots(&rows)),
        ExpenseStatus::WaitingApproval
    );

    let rows = vec![
        step_row(expense.id, 0, sea_orm_active_enums::StepStatus::Approved),
        step_row(expense.id, 1, sea_orm_active_enums::StepStatus::Approved),
    ];
    assert_eq!(
        StatusEvaluator::evaluate(policy, &steps_to_snapshots(&rows)),
        ExpenseStatus::Approved
    );
}

#[test]
fn rejection_settles_from_persisted_rows() {
    let expense = waiting_expense(sea_orm_active_enums::RuleType::Hybrid);
    let policy = rule_policy_of(&expense).unwrap();

    let rows = vec![
        step_row(expense.id, 0, sea_orm_active_enums::StepStatus::Pending),
        step_row(expense.id, 1, sea_orm_active_enums::StepStatus::Rejected),
    ];
    assert_eq!(
        StatusEvaluator::evaluate(policy, &steps_to_snapshots(&rows)),
        ExpenseStatus::Rejected
    );
}
