use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::PurchaseStore;
use crate::gifts::Gift;
use crate::payments::{NewPurchase, PaymentMethod, PaymentStatus, Purchase, PurchaseFilter};

#[derive(Clone)]
pub struct PgPurchaseStore {
    db_pool: PgPool,
}

impl PgPurchaseStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PurchaseStore for PgPurchaseStore {
    async fn get_gift(&self, gift_id: i32) -> Result<Option<Gift>, sqlx::Error> {
        sqlx::query_as::<_, Gift>("SELECT * FROM gifts WHERE id = $1")
            .bind(gift_id)
            .fetch_optional(&self.db_pool)
            .await
    }

    async fn get_purchase(&self, purchase_id: i32) -> Result<Option<Purchase>, sqlx::Error> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1")
            .bind(purchase_id)
            .fetch_optional(&self.db_pool)
            .await
    }

    async fn purchases_for_gift(&self, gift_id: i32) -> Result<Vec<Purchase>, sqlx::Error> {
        sqlx::query_as::<_, Purchase>(
            "SELECT * FROM purchases WHERE gift_id = $1 ORDER BY purchased_at ASC, id ASC",
        )
        .bind(gift_id)
        .fetch_all(&self.db_pool)
        .await
    }

    async fn find_by_charge_id(&self, charge_id: &str) -> Result<Option<Purchase>, sqlx::Error> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE pix_charge_id = $1 LIMIT 1")
            .bind(charge_id)
            .fetch_optional(&self.db_pool)
            .await
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE payment_id = $1 LIMIT 1")
            .bind(payment_id)
            .fetch_optional(&self.db_pool)
            .await
    }

    async fn list_purchases(&self, filter: &PurchaseFilter) -> Result<Vec<Purchase>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM purchases WHERE 1 = 1");

        if let Some(status) = filter.status {
            query.push(" AND payment_status = ").push_bind(status);
        }
        if let Some(gift_id) = filter.gift_id {
            query.push(" AND gift_id = ").push_bind(gift_id);
        }
        query.push(" ORDER BY purchased_at DESC, id DESC");

        query
            .build_query_as::<Purchase>()
            .fetch_all(&self.db_pool)
            .await
    }

    async fn reserve_gift(&self, gift_id: i32) -> Result<bool, sqlx::Error> {
        let reserved = sqlx::query_scalar::<_, i32>(
            "UPDATE gifts SET available = false WHERE id = $1 AND available RETURNING id",
        )
        .bind(gift_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(reserved.is_some())
    }

    async fn release_gift(&self, gift_id: i32) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE gifts SET available = true WHERE id = $1")
            .bind(gift_id)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    async fn insert_pending(&self, purchase: NewPurchase) -> Result<Purchase, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (
                gift_id, guest_id, buyer_name, buyer_phone, buyer_email, buyer_tax_id,
                payment_method, payment_status, payment_id, pix_charge_id,
                pix_qr_code, pix_qr_code_base64, expires_at, metadata,
                purchased_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(purchase.gift_id)
        .bind(purchase.guest_id)
        .bind(purchase.buyer_name)
        .bind(purchase.buyer_phone)
        .bind(purchase.buyer_email)
        .bind(purchase.buyer_tax_id)
        .bind(purchase.payment_method)
        .bind(PaymentStatus::Pending)
        .bind(purchase.payment_id)
        .bind(purchase.pix_charge_id)
        .bind(purchase.pix_qr_code)
        .bind(purchase.pix_qr_code_base64)
        .bind(purchase.expires_at)
        .bind(purchase.metadata)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await
    }

    async fn transition(
        &self,
        purchase_id: i32,
        target: PaymentStatus,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let mut tx = self.db_pool.begin().await?;

        let updated = sqlx::query_as::<_, Purchase>(
            r#"
            UPDATE purchases
            SET payment_status = $1, updated_at = $2
            WHERE id = $3 AND payment_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(target)
        .bind(Utc::now())
        .bind(purchase_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(purchase) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE gifts SET available = $1 WHERE id = $2")
            .bind(target.gift_available())
            .bind(purchase.gift_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(purchase))
    }

    async fn set_payment_method(
        &self,
        purchase_id: i32,
        method: PaymentMethod,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE purchases SET payment_method = $1, updated_at = $2 WHERE id = $3")
            .bind(method)
            .bind(Utc::now())
            .bind(purchase_id)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }
}
