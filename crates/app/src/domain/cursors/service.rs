//! Sync cursors service.

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::{
    database::Db,
    domain::{
        cursors::{
            data::{AdvanceOutcome, CursorAdvance},
            errors::SyncCursorsServiceError,
            records::SyncCursorRecord,
            repository::PgSyncCursorsRepository,
        },
        entities::EntityType,
        tenants::records::TenantUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgSyncCursorsService {
    db: Db,
    repository: PgSyncCursorsRepository,
}

impl PgSyncCursorsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgSyncCursorsRepository::new(),
        }
    }
}

#[async_trait]
impl SyncCursorsService for PgSyncCursorsService {
    async fn get_cursor(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
    ) -> Result<SyncCursorRecord, SyncCursorsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let cursor = self.repository.get_cursor(&mut tx, entity_type).await?;

        tx.commit().await?;

        Ok(cursor)
    }

    async fn advance_cursor(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
        advance: CursorAdvance,
    ) -> Result<AdvanceOutcome, SyncCursorsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        self.repository
            .create_initial_cursor(&mut tx, tenant, entity_type)
            .await?;

        let current = self.repository.lock_cursor(&mut tx, entity_type).await?;

        if !advance.last_sync_id.is_after(current.last_sync_id.as_ref()) {
            debug!(
                %tenant,
                %entity_type,
                proposed = %advance.last_sync_id,
                "cursor not advanced; proposed id is not ahead of the stored one"
            );

            tx.commit().await?;

            return Ok(AdvanceOutcome::Unchanged(current));
        }

        let written = self
            .repository
            .write_cursor(
                &mut tx,
                entity_type,
                &advance.last_sync_id,
                &advance.metadata,
            )
            .await?;

        tx.commit().await?;

        Ok(AdvanceOutcome::Advanced(written))
    }

    async fn reset_cursor(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
    ) -> Result<SyncCursorRecord, SyncCursorsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let cursor = self.repository.reset_cursor(&mut tx, entity_type).await?;

        tx.commit().await?;

        Ok(cursor)
    }

    async fn list_cursors(
        &self,
        tenant: TenantUuid,
    ) -> Result<Vec<SyncCursorRecord>, SyncCursorsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let cursors = self.repository.list_cursors(&mut tx).await?;

        tx.commit().await?;

        Ok(cursors)
    }
}

#[automock]
#[async_trait]
pub trait SyncCursorsService: Send + Sync {
    /// Retrieve the cursor for one entity type.
    async fn get_cursor(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
    ) -> Result<SyncCursorRecord, SyncCursorsServiceError>;

    /// Move the watermark forward to `advance.last_sync_id`.
    ///
    /// The stored row is locked for the duration of the comparison, so concurrent writers
    /// serialise and the watermark can only grow.
    async fn advance_cursor(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
        advance: CursorAdvance,
    ) -> Result<AdvanceOutcome, SyncCursorsServiceError>;

    /// Clear the watermark so the next sync starts from the beginning.
    async fn reset_cursor(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
    ) -> Result<SyncCursorRecord, SyncCursorsServiceError>;

    /// List every cursor of a tenant.
    async fn list_cursors(
        &self,
        tenant: TenantUuid,
    ) -> Result<Vec<SyncCursorRecord>, SyncCursorsServiceError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::{domain::cursors::CursorValue, test::TestContext};

    use super::*;

    fn advance_to(id: &str) -> CursorAdvance {
        CursorAdvance {
            last_sync_id: CursorValue::from(id),
            metadata: json!({ "page": 1 }),
        }
    }

    #[tokio::test]
    async fn provisioned_tenant_has_empty_cursor_per_entity_type() -> TestResult {
        let ctx = TestContext::new().await;

        let cursors = ctx.cursors.list_cursors(ctx.tenant_uuid).await?;

        assert_eq!(cursors.len(), EntityType::ALL.len());
        assert!(cursors.iter().all(|cursor| cursor.last_sync_id.is_none()));

        Ok(())
    }

    #[tokio::test]
    async fn advance_cursor_moves_forward() -> TestResult {
        let ctx = TestContext::new().await;

        let outcome = ctx
            .cursors
            .advance_cursor(ctx.tenant_uuid, EntityType::Product, advance_to("10"))
            .await?;

        assert!(matches!(outcome, AdvanceOutcome::Advanced(_)));

        let cursor = ctx
            .cursors
            .get_cursor(ctx.tenant_uuid, EntityType::Product)
            .await?;

        assert_eq!(cursor.last_sync_id, Some(CursorValue::from("10")));
        assert_eq!(cursor.metadata["page"], 1);
        assert!(cursor.last_sync_at.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn advance_cursor_never_moves_backwards() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.cursors
            .advance_cursor(ctx.tenant_uuid, EntityType::Product, advance_to("10"))
            .await?;

        let outcome = ctx
            .cursors
            .advance_cursor(ctx.tenant_uuid, EntityType::Product, advance_to("9"))
            .await?;

        assert!(matches!(outcome, AdvanceOutcome::Unchanged(_)));
        assert_eq!(
            outcome.record().last_sync_id,
            Some(CursorValue::from("10"))
        );

        Ok(())
    }

    #[tokio::test]
    async fn reset_cursor_clears_the_watermark() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.cursors
            .advance_cursor(ctx.tenant_uuid, EntityType::Customer, advance_to("C9"))
            .await?;

        let cursor = ctx
            .cursors
            .reset_cursor(ctx.tenant_uuid, EntityType::Customer)
            .await?;

        assert!(cursor.last_sync_id.is_none());
        assert!(cursor.last_sync_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn cursor_not_visible_to_other_tenant() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant_b = ctx.create_tenant("Tenant B").await;

        ctx.cursors
            .advance_cursor(ctx.tenant_uuid, EntityType::Product, advance_to("42"))
            .await?;

        let cursor = ctx
            .cursors
            .get_cursor(tenant_b, EntityType::Product)
            .await?;

        assert_eq!(cursor.tenant_uuid, tenant_b);
        assert!(cursor.last_sync_id.is_none());

        Ok(())
    }
}
