//! Gift catalogue models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

use crate::payments::PaymentMethod;

/// Sellable registry item
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Gift {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    /// Cleared while a purchase is pending or paid
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

/// Buyer details shown next to a gift once it is paid for
#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GiftBuyer {
    #[serde(skip)]
    pub gift_id: i32,
    pub buyer_name: String,
    pub buyer_email: Option<String>,
    pub purchased_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
}

/// Gift with its paid purchases
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GiftWithBuyers {
    #[serde(flatten)]
    pub gift: Gift,
    pub purchases: Vec<GiftBuyer>,
}

/// Paginated gift listing
#[derive(Debug, Serialize)]
pub struct GiftPage {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub gifts: Vec<GiftWithBuyers>,
}

/// Query parameters for listing gifts
#[derive(Debug, Deserialize, Default)]
pub struct ListGiftsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request DTO for creating a gift
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGiftRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub available: Option<bool>,
}

impl CreateGiftRequest {
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        if name.chars().count() > 100 {
            return Err("Name must be at most 100 characters".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err("Price must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Partial update; empty strings clear `description` and `imageUrl`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGiftRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
    pub available: Option<bool>,
}

impl UpdateGiftRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.price.is_none()
            && self.available.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_create_gift_validation() {
        let mut request = CreateGiftRequest {
            name: "Jogo de panelas".to_string(),
            description: None,
            image_url: None,
            price: Decimal::from_str("349.90").unwrap(),
            available: None,
        };
        assert!(request.validate().is_ok());

        request.price = Decimal::ZERO;
        assert!(request.validate().is_err());

        request.price = Decimal::ONE;
        request.name = "   ".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_gift_is_empty() {
        assert!(UpdateGiftRequest::default().is_empty());
        let update = UpdateGiftRequest {
            description: Some(String::new()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
