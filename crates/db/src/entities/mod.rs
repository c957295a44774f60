//! `SeaORM` entity definitions for the Spesa schema.

pub mod approval_rules;
pub mod approval_steps;
pub mod audit_events;
pub mod companies;
pub mod exchange_rate_quotes;
pub mod expenses;
pub mod sea_orm_active_enums;
pub mod users;
