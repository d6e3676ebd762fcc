//! Gift catalogue service

use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use thiserror::Error;

use super::{
    CreateGiftRequest, Gift, GiftBuyer, GiftPage, GiftWithBuyers, ListGiftsQuery,
    UpdateGiftRequest,
};
use crate::payments::PaymentStatus;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Error, Debug)]
pub enum GiftError {
    #[error("Gift not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Clamp page/limit to sane bounds, returning `(page, limit, offset)`
fn page_bounds(query: &ListGiftsQuery) -> (i64, i64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, limit, (page - 1) * limit)
}

/// Empty strings clear optional text columns
fn blank_to_none(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// `UPDATE gifts ... RETURNING *` for the fields present in `request`.
///
/// Writing `available` is refused while the gift has a pending or paid
/// purchase: the row is left untouched and nothing is returned.
fn update_query(gift_id: i32, request: UpdateGiftRequest) -> QueryBuilder<'static, Postgres> {
    let guard_availability = request.available.is_some();
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE gifts SET ");
    let mut fields = query.separated(", ");

    if let Some(name) = request.name {
        fields.push("name = ").push_bind_unseparated(name.trim().to_string());
    }
    if let Some(description) = blank_to_none(request.description) {
        fields.push("description = ").push_bind_unseparated(description);
    }
    if let Some(image_url) = blank_to_none(request.image_url) {
        fields.push("image_url = ").push_bind_unseparated(image_url);
    }
    if let Some(price) = request.price {
        fields.push("price = ").push_bind_unseparated(price);
    }
    if let Some(available) = request.available {
        fields.push("available = ").push_bind_unseparated(available);
    }

    query.push(" WHERE id = ").push_bind(gift_id);
    if guard_availability {
        query
            .push(" AND NOT EXISTS (SELECT 1 FROM purchases WHERE gift_id = ")
            .push_bind(gift_id)
            .push(" AND payment_status IN ('pending', 'paid'))");
    }
    query.push(" RETURNING *");
    query
}

/// Why an update touched no row
fn missing_update_error(gift_exists: bool, availability_guarded: bool) -> GiftError {
    if gift_exists && availability_guarded {
        GiftError::Conflict(
            "Gift availability cannot change while a purchase is pending or paid".to_string(),
        )
    } else {
        GiftError::NotFound
    }
}

#[derive(Clone)]
pub struct GiftService {
    db_pool: PgPool,
}

impl GiftService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Paginated gifts, each with the buyers of its paid purchases
    pub async fn list(&self, query: &ListGiftsQuery) -> Result<GiftPage, GiftError> {
        let (page, limit, offset) = page_bounds(query);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gifts")
            .fetch_one(&self.db_pool)
            .await?;

        let gifts = sqlx::query_as::<_, Gift>(
            "SELECT * FROM gifts ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let ids: Vec<i32> = gifts.iter().map(|g| g.id).collect();
        let buyers = sqlx::query_as::<_, GiftBuyer>(
            r#"
            SELECT gift_id, buyer_name, buyer_email, purchased_at, payment_method
            FROM purchases
            WHERE gift_id = ANY($1) AND payment_status = $2
            ORDER BY purchased_at ASC
            "#,
        )
        .bind(&ids)
        .bind(PaymentStatus::Paid)
        .fetch_all(&self.db_pool)
        .await?;

        let mut by_gift: HashMap<i32, Vec<GiftBuyer>> = HashMap::new();
        for buyer in buyers {
            by_gift.entry(buyer.gift_id).or_default().push(buyer);
        }

        let gifts = gifts
            .into_iter()
            .map(|gift| GiftWithBuyers {
                purchases: by_gift.remove(&gift.id).unwrap_or_default(),
                gift,
            })
            .collect();

        Ok(GiftPage {
            total,
            page,
            limit,
            gifts,
        })
    }

    pub async fn get(&self, gift_id: i32) -> Result<GiftWithBuyers, GiftError> {
        let gift = sqlx::query_as::<_, Gift>("SELECT * FROM gifts WHERE id = $1")
            .bind(gift_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(GiftError::NotFound)?;

        let purchases = sqlx::query_as::<_, GiftBuyer>(
            r#"
            SELECT gift_id, buyer_name, buyer_email, purchased_at, payment_method
            FROM purchases
            WHERE gift_id = $1 AND payment_status = $2
            ORDER BY purchased_at ASC
            "#,
        )
        .bind(gift_id)
        .bind(PaymentStatus::Paid)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(GiftWithBuyers { gift, purchases })
    }

    pub async fn create(&self, request: CreateGiftRequest) -> Result<Gift, GiftError> {
        request.validate().map_err(GiftError::Validation)?;

        let gift = sqlx::query_as::<_, Gift>(
            r#"
            INSERT INTO gifts (name, description, image_url, price, available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.name.trim())
        .bind(blank_to_none(request.description).flatten())
        .bind(blank_to_none(request.image_url).flatten())
        .bind(request.price)
        .bind(request.available.unwrap_or(true))
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(gift_id = gift.id, name = %gift.name, "Gift created");
        Ok(gift)
    }

    pub async fn update(&self, gift_id: i32, request: UpdateGiftRequest) -> Result<Gift, GiftError> {
        if request.is_empty() {
            return Err(GiftError::Validation("No fields to update".to_string()));
        }
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(GiftError::Validation("Name is required".to_string()));
            }
        }
        if let Some(price) = request.price {
            if price <= rust_decimal::Decimal::ZERO {
                return Err(GiftError::Validation(
                    "Price must be greater than 0".to_string(),
                ));
            }
        }

        let guarded = request.available.is_some();
        let gift = update_query(gift_id, request)
            .build_query_as::<Gift>()
            .fetch_optional(&self.db_pool)
            .await?;

        let Some(gift) = gift else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM gifts WHERE id = $1)")
                .bind(gift_id)
                .fetch_one(&self.db_pool)
                .await?;
            return Err(missing_update_error(exists, guarded));
        };

        tracing::info!(gift_id, "Gift updated");
        Ok(gift)
    }

    /// Gifts with any purchase history cannot be deleted
    pub async fn delete(&self, gift_id: i32) -> Result<(), GiftError> {
        let purchases: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE gift_id = $1")
                .bind(gift_id)
                .fetch_one(&self.db_pool)
                .await?;

        if purchases > 0 {
            return Err(GiftError::Conflict(
                "Gift has purchases and cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM gifts WHERE id = $1")
            .bind(gift_id)
            .execute(&self.db_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GiftError::NotFound);
        }

        tracing::info!(gift_id, "Gift deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        let query = ListGiftsQuery {
            page: None,
            limit: None,
        };
        assert_eq!(page_bounds(&query), (1, 20, 0));

        let query = ListGiftsQuery {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(page_bounds(&query), (3, 100, 200));

        let query = ListGiftsQuery {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(page_bounds(&query), (1, 1, 0));
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(None), None);
        assert_eq!(blank_to_none(Some("  ".to_string())), Some(None));
        assert_eq!(
            blank_to_none(Some(" vase ".to_string())),
            Some(Some("vase".to_string()))
        );
    }

    fn availability_update(available: bool) -> UpdateGiftRequest {
        UpdateGiftRequest {
            available: Some(available),
            ..Default::default()
        }
    }

    #[test]
    fn test_availability_update_guarded_by_active_purchases() {
        let query = update_query(1, availability_update(true));
        assert_eq!(
            query.sql(),
            "UPDATE gifts SET available = $1 WHERE id = $2 \
             AND NOT EXISTS (SELECT 1 FROM purchases WHERE gift_id = $3 \
             AND payment_status IN ('pending', 'paid')) RETURNING *"
        );
    }

    #[test]
    fn test_other_fields_update_unguarded() {
        let request = UpdateGiftRequest {
            name: Some(" Cafeteira ".to_string()),
            description: Some(String::new()),
            ..Default::default()
        };
        let query = update_query(4, request);
        assert_eq!(
            query.sql(),
            "UPDATE gifts SET name = $1, description = $2 WHERE id = $3 RETURNING *"
        );
    }

    #[test]
    fn test_blocked_availability_update_is_conflict() {
        assert!(matches!(
            missing_update_error(true, true),
            GiftError::Conflict(_)
        ));
        assert!(matches!(missing_update_error(false, true), GiftError::NotFound));
        assert!(matches!(missing_update_error(false, false), GiftError::NotFound));
    }
}
