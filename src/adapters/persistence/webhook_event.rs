use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription_billing::WebhookEventRepo,
};

#[async_trait]
impl WebhookEventRepo for PostgresPersistence {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM billing_webhook_events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(row.is_some())
    }

    async fn mark_processed(
        &self,
        event_id: &str,
        event_type: &str,
        resource_id: Option<&str>,
    ) -> AppResult<()> {
        // A concurrent delivery of the same event may have recorded it first
        sqlx::query(
            r#"
            INSERT INTO billing_webhook_events (id, event_type, resource_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(resource_id)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
