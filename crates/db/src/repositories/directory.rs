//! Org directory resolver: manager chains and company rosters.
//!
//! Backs the workflow builder's approver context. Only active users are
//! ever returned as approvers.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use spesa_core::workflow::{ApproverRef, UserRole};

use crate::entities::{sea_orm_active_enums, users};

/// Upper bound on manager-chain traversal.
///
/// The chain walk follows manager links upward; accidentally cyclic or
/// absurdly deep org data must not hang a submission.
pub const MAX_CHAIN_DEPTH: usize = 32;

/// Errors from directory lookups.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// User not found.
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Directory repository resolving org hierarchy questions.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    db: DatabaseConnection,
}

impl DirectoryRepository {
    /// Creates a new directory repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Walks the manager chain upward from `user_id`.
    ///
    /// Returns the ids of active managers in walk order. The traversal is
    /// bounded: a visited set stops cycles and `MAX_CHAIN_DEPTH` stops
    /// runaway chains. Inactive links are skipped but walked through, so
    /// an inactive middle manager does not cut their own manager out of
    /// the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the starting user does not exist or a query
    /// fails.
    pub async fn manager_chain_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, DirectoryError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(DirectoryError::UserNotFound(user_id))?;

        let mut chain = Vec::new();
        let mut visited: HashSet<Uuid> = HashSet::from([user_id]);
        let mut next = user.manager_id;
        let mut hops = 0usize;

        while let Some(manager_id) = next {
            hops += 1;
            if hops > MAX_CHAIN_DEPTH {
                break;
            }
            if !visited.insert(manager_id) {
                // cycle in manager links
                break;
            }
            let Some(manager) = users::Entity::find_by_id(manager_id).one(&self.db).await? else {
                break;
            };
            next = manager.manager_id;
            if manager.is_active {
                chain.push(manager.id);
            }
        }

        Ok(chain)
    }

    /// Lists active users of a company holding any of the given roles.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn roster_of(
        &self,
        company_id: Uuid,
        roles: &[UserRole],
    ) -> Result<Vec<users::Model>, DirectoryError> {
        let db_roles: Vec<sea_orm_active_enums::UserRole> =
            roles.iter().map(|r| role_to_db(*r)).collect();

        let roster = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::IsActive.eq(true))
            .filter(users::Column::Role.is_in(db_roles))
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(roster)
    }

    /// Looks up reference data for a candidate approver.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn approver_ref(&self, user_id: Uuid) -> Result<Option<ApproverRef>, DirectoryError> {
        let user = users::Entity::find_by_id(user_id).one(&self.db).await?;
        Ok(user.map(|u| ApproverRef {
            id: u.id,
            company_id: u.company_id,
            is_active: u.is_active,
        }))
    }
}

/// Converts a core role to the database enum.
#[must_use]
pub fn role_to_db(role: UserRole) -> sea_orm_active_enums::UserRole {
    match role {
        UserRole::Employee => sea_orm_active_enums::UserRole::Employee,
        UserRole::Manager => sea_orm_active_enums::UserRole::Manager,
        UserRole::Admin => sea_orm_active_enums::UserRole::Admin,
    }
}

/// Converts a database role to the core enum.
#[must_use]
pub fn role_to_core(role: &sea_orm_active_enums::UserRole) -> UserRole {
    match role {
        sea_orm_active_enums::UserRole::Employee => UserRole::Employee,
        sea_orm_active_enums::UserRole::Manager => UserRole::Manager,
        sea_orm_active_enums::UserRole::Admin => UserRole::Admin,
    }
}
