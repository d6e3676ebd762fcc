use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::PurchaseStore;
use crate::gifts::Gift;
use crate::payments::{NewPurchase, PaymentMethod, PaymentStatus, Purchase, PurchaseFilter};

#[derive(Default)]
struct Tables {
    gifts: HashMap<i32, Gift>,
    purchases: HashMap<i32, Purchase>,
    next_purchase_id: i32,
}

/// In-process store with the same conditional-update semantics as Postgres.
///
/// A single lock covers both tables, so `transition` is atomic.
#[derive(Default)]
pub struct MemoryPurchaseStore {
    tables: RwLock<Tables>,
}

impl MemoryPurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_gift(&self, gift: Gift) {
        self.tables.write().await.gifts.insert(gift.id, gift);
    }

    /// Store a purchase as-is, keeping its id
    pub async fn insert_purchase(&self, purchase: Purchase) {
        let mut tables = self.tables.write().await;
        tables.next_purchase_id = tables.next_purchase_id.max(purchase.id);
        tables.purchases.insert(purchase.id, purchase);
    }

    pub async fn gift(&self, gift_id: i32) -> Option<Gift> {
        self.tables.read().await.gifts.get(&gift_id).cloned()
    }

    pub async fn purchase_count(&self) -> usize {
        self.tables.read().await.purchases.len()
    }
}

fn oldest_first(purchases: &mut [Purchase]) {
    purchases.sort_by(|a, b| {
        a.purchased_at
            .cmp(&b.purchased_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl PurchaseStore for MemoryPurchaseStore {
    async fn get_gift(&self, gift_id: i32) -> Result<Option<Gift>, sqlx::Error> {
        Ok(self.gift(gift_id).await)
    }

    async fn get_purchase(&self, purchase_id: i32) -> Result<Option<Purchase>, sqlx::Error> {
        Ok(self.tables.read().await.purchases.get(&purchase_id).cloned())
    }

    async fn purchases_for_gift(&self, gift_id: i32) -> Result<Vec<Purchase>, sqlx::Error> {
        let tables = self.tables.read().await;
        let mut purchases: Vec<Purchase> = tables
            .purchases
            .values()
            .filter(|p| p.gift_id == gift_id)
            .cloned()
            .collect();
        oldest_first(&mut purchases);
        Ok(purchases)
    }

    async fn find_by_charge_id(&self, charge_id: &str) -> Result<Option<Purchase>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .purchases
            .values()
            .find(|p| p.pix_charge_id.as_deref() == Some(charge_id))
            .cloned())
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .purchases
            .values()
            .find(|p| p.payment_id.as_deref() == Some(payment_id))
            .cloned())
    }

    async fn list_purchases(&self, filter: &PurchaseFilter) -> Result<Vec<Purchase>, sqlx::Error> {
        let tables = self.tables.read().await;
        let mut purchases: Vec<Purchase> = tables
            .purchases
            .values()
            .filter(|p| filter.status.map_or(true, |s| p.payment_status == s))
            .filter(|p| filter.gift_id.map_or(true, |g| p.gift_id == g))
            .cloned()
            .collect();
        oldest_first(&mut purchases);
        purchases.reverse();
        Ok(purchases)
    }

    async fn reserve_gift(&self, gift_id: i32) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.write().await;
        match tables.gifts.get_mut(&gift_id) {
            Some(gift) if gift.available => {
                gift.available = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_gift(&self, gift_id: i32) -> Result<(), sqlx::Error> {
        if let Some(gift) = self.tables.write().await.gifts.get_mut(&gift_id) {
            gift.available = true;
        }
        Ok(())
    }

    async fn insert_pending(&self, new: NewPurchase) -> Result<Purchase, sqlx::Error> {
        let mut tables = self.tables.write().await;
        tables.next_purchase_id += 1;
        let now = Utc::now();

        let purchase = Purchase {
            id: tables.next_purchase_id,
            gift_id: new.gift_id,
            guest_id: new.guest_id,
            buyer_name: new.buyer_name,
            buyer_phone: new.buyer_phone,
            buyer_email: new.buyer_email,
            buyer_tax_id: new.buyer_tax_id,
            payment_method: new.payment_method,
            payment_status: PaymentStatus::Pending,
            payment_id: new.payment_id,
            pix_charge_id: new.pix_charge_id,
            pix_qr_code: new.pix_qr_code,
            pix_qr_code_base64: new.pix_qr_code_base64,
            expires_at: new.expires_at,
            metadata: new.metadata,
            purchased_at: now,
            updated_at: now,
        };
        tables.purchases.insert(purchase.id, purchase.clone());
        Ok(purchase)
    }

    async fn transition(
        &self,
        purchase_id: i32,
        target: PaymentStatus,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let mut tables = self.tables.write().await;

        let updated = match tables.purchases.get_mut(&purchase_id) {
            Some(purchase) if purchase.payment_status == PaymentStatus::Pending => {
                purchase.payment_status = target;
                purchase.updated_at = Utc::now();
                purchase.clone()
            }
            _ => return Ok(None),
        };

        if let Some(gift) = tables.gifts.get_mut(&updated.gift_id) {
            gift.available = target.gift_available();
        }

        Ok(Some(updated))
    }

    async fn set_payment_method(
        &self,
        purchase_id: i32,
        method: PaymentMethod,
    ) -> Result<(), sqlx::Error> {
        if let Some(purchase) = self.tables.write().await.purchases.get_mut(&purchase_id) {
            purchase.payment_method = method;
            purchase.updated_at = Utc::now();
        }
        Ok(())
    }
}
