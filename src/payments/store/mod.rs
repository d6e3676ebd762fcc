//! Purchase persistence
//!
//! The payment service only talks to [`PurchaseStore`]. Production uses
//! [`PgPurchaseStore`]; [`MemoryPurchaseStore`] backs the reconciliation tests
//! and the router tests.

mod memory;
mod postgres;

use async_trait::async_trait;

use super::{NewPurchase, PaymentMethod, PaymentStatus, Purchase, PurchaseFilter};
use crate::gifts::Gift;

pub use memory::MemoryPurchaseStore;
pub use postgres::PgPurchaseStore;

#[async_trait]
pub trait PurchaseStore: Send + Sync {
    async fn get_gift(&self, gift_id: i32) -> Result<Option<Gift>, sqlx::Error>;

    async fn get_purchase(&self, purchase_id: i32) -> Result<Option<Purchase>, sqlx::Error>;

    /// All purchases of a gift, oldest first
    async fn purchases_for_gift(&self, gift_id: i32) -> Result<Vec<Purchase>, sqlx::Error>;

    async fn find_by_charge_id(&self, charge_id: &str) -> Result<Option<Purchase>, sqlx::Error>;

    async fn find_by_payment_id(&self, payment_id: &str)
        -> Result<Option<Purchase>, sqlx::Error>;

    /// Newest first
    async fn list_purchases(&self, filter: &PurchaseFilter) -> Result<Vec<Purchase>, sqlx::Error>;

    /// Flip `available` to false only if it is currently true.
    /// Returns false when the gift is missing or already reserved.
    async fn reserve_gift(&self, gift_id: i32) -> Result<bool, sqlx::Error>;

    async fn release_gift(&self, gift_id: i32) -> Result<(), sqlx::Error>;

    async fn insert_pending(&self, purchase: NewPurchase) -> Result<Purchase, sqlx::Error>;

    /// Move a `pending` purchase to `target` and set the gift's availability
    /// to `target.gift_available()`, atomically.
    ///
    /// Returns `None` if the purchase was no longer pending.
    async fn transition(
        &self,
        purchase_id: i32,
        target: PaymentStatus,
    ) -> Result<Option<Purchase>, sqlx::Error>;

    async fn set_payment_method(
        &self,
        purchase_id: i32,
        method: PaymentMethod,
    ) -> Result<(), sqlx::Error>;
}
