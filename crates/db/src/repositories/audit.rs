//! Fire-and-forget audit trail.
//!
//! One event per rule application, per step decision, and per terminal
//! transition. Failures here must never block or roll back the workflow:
//! they are logged and swallowed.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::warn;
use uuid::Uuid;

use crate::entities::audit_events;

/// Audit sink writing `audit_events` rows.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records one audit event, best-effort.
    ///
    /// Insert failures are logged at warn level and swallowed.
    pub async fn record(
        &self,
        entity: &str,
        entity_id: Uuid,
        action: &str,
        actor_id: Option<Uuid>,
        snapshot: serde_json::Value,
    ) {
        let event = audit_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            entity: Set(entity.to_string()),
            entity_id: Set(entity_id),
            action: Set(action.to_string()),
            actor_id: Set(actor_id),
            snapshot: Set(snapshot),
            created_at: Set(chrono::Utc::now().into()),
        };

        if let Err(e) = event.insert(&self.db).await {
            warn!(entity, %entity_id, action, error = %e, "audit event dropped");
        }
    }

    /// Lists the recorded trail for one entity, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn events_for(
        &self,
        entity: &str,
        entity_id: Uuid,
    ) -> Result<Vec<audit_events::Model>, DbErr> {
        audit_events::Entity::find()
            .filter(audit_events::Column::Entity.eq(entity))
            .filter(audit_events::Column::EntityId.eq(entity_id))
            .order_by_desc(audit_events::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}
