use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription_billing::{ActivateMembershipInput, SubscriptionRepo},
    domain::entities::{
        membership::MembershipStatus,
        subscription::{Subscription, SubscriptionStatus},
    },
};

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        status: row.get("status"),
        plan_id: row.get("plan_id"),
        current_period_start: row.get("current_period_start"),
        current_period_end: row.get("current_period_end"),
        amount_cents: row.get("amount_cents"),
        currency: row.get("currency"),
        is_trial: row.get("is_trial"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, status, plan_id, current_period_start, current_period_end,
    amount_cents, currency, is_trial, created_at, updated_at
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn activate_membership(&self, input: &ActivateMembershipInput) -> AppResult<bool> {
        let sub = &input.subscription;
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, status, plan_id, current_period_start, current_period_end,
                amount_cents, currency, is_trial
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&sub.id)
        .bind(sub.user_id)
        .bind(sub.status)
        .bind(&sub.plan_id)
        .bind(sub.current_period_start)
        .bind(sub.current_period_end)
        .bind(sub.amount_cents)
        .bind(&sub.currency)
        .bind(sub.is_trial)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?
        .rows_affected()
            == 1;

        if !inserted {
            tx.rollback().await.map_err(AppError::from)?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO profiles (id, membership_status, membership_plan, membership_expires, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (id) DO UPDATE SET
                membership_status = EXCLUDED.membership_status,
                membership_plan = EXCLUDED.membership_plan,
                membership_expires = EXCLUDED.membership_expires,
                updated_at = NOW()
            "#,
        )
        .bind(sub.user_id)
        .bind(MembershipStatus::Pro)
        .bind(&input.membership_plan)
        .bind(input.membership_expires)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(true)
    }

    async fn update_status(&self, id: &str, status: SubscriptionStatus) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn extend_membership(&self, id: &str, period_end: DateTime<Utc>) -> AppResult<bool> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;

        let owner: Option<Uuid> = sqlx::query(
            r#"
            UPDATE subscriptions
            SET current_period_end = $2, updated_at = NOW()
            WHERE id = $1 AND (current_period_end IS NULL OR current_period_end < $2)
            RETURNING user_id
            "#,
        )
        .bind(id)
        .bind(period_end)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .map(|row| row.get("user_id"));

        let Some(user_id) = owner else {
            tx.rollback().await.map_err(AppError::from)?;
            return Ok(false);
        };

        sqlx::query(
            r#"
            UPDATE profiles SET
                membership_status = $2,
                membership_expires = GREATEST(COALESCE(membership_expires, $3), $3),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(MembershipStatus::Pro)
        .bind(period_end)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(true)
    }
}
