use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription_billing::ProfileRepo,
    domain::entities::profile::Profile,
};

fn row_to_profile(row: sqlx::postgres::PgRow) -> Profile {
    Profile {
        user_id: row.get("id"),
        email: row.get("email"),
        membership_status: row.get("membership_status"),
        membership_plan: row.get("membership_plan"),
        membership_expires: row.get("membership_expires"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ProfileRepo for PostgresPersistence {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, membership_status, membership_plan, membership_expires, updated_at
            FROM profiles WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_profile))
    }
}
