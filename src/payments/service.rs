//! Payment service - purchase creation and the lifecycle operations around it

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use super::store::PurchaseStore;
use super::{
    clean_tax_id, CreatePaymentRequest, CreatePaymentResponse, NewPurchase, PaymentMethod,
    PaymentStatus, PixPaymentData, Purchase, PurchaseFilter, PurchaseWithGift, StatusCheck,
};
use crate::config::PaymentProvider;
use crate::gifts::Gift;
use crate::providers::{
    CheckoutGateway, CreatePixCharge, CreatePreference, PixChargeStatus, PixCustomer, PixGateway,
    ProviderError,
};

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(String),

    #[error("payment provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct PaymentService {
    pub(super) store: Arc<dyn PurchaseStore>,
    pub(super) pix: Arc<dyn PixGateway>,
    pub(super) checkout: Arc<dyn CheckoutGateway>,
    provider: PaymentProvider,
    charge_expires_in: i64,
}

/// Price in cents, rounded half away from zero
fn amount_in_cents(price: Decimal) -> i64 {
    (price * Decimal::ONE_HUNDRED).round().to_i64().unwrap_or(0)
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PurchaseStore>,
        pix: Arc<dyn PixGateway>,
        checkout: Arc<dyn CheckoutGateway>,
        provider: PaymentProvider,
        charge_expires_in: i64,
    ) -> Self {
        Self {
            store,
            pix,
            checkout,
            provider,
            charge_expires_in,
        }
    }

    pub fn provider(&self) -> PaymentProvider {
        self.provider
    }

    pub fn is_dev_mode(&self) -> bool {
        self.pix.is_dev_mode()
    }

    pub(super) async fn require_purchase(&self, purchase_id: i32) -> Result<Purchase, PaymentError> {
        self.store
            .get_purchase(purchase_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound("Purchase not found".to_string()))
    }

    /// Start a payment for a gift with the active provider.
    ///
    /// The gift is reserved before the provider is called and released again
    /// if the provider call or the insert fails.
    pub async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<CreatePaymentResponse, PaymentError> {
        request
            .validate()
            .map_err(|e| PaymentError::Validation(e.to_string()))?;

        let gift = self
            .store
            .get_gift(request.gift_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound("Gift not found".to_string()))?;

        let now = Utc::now();
        let purchases = self.store.purchases_for_gift(gift.id).await?;

        if purchases
            .iter()
            .any(|p| p.payment_status == PaymentStatus::Paid)
        {
            return Err(PaymentError::InvalidState(
                "This gift has already been purchased".to_string(),
            ));
        }
        if purchases.iter().any(|p| p.blocks_new_purchase(now)) {
            return Err(PaymentError::InvalidState(
                "A payment is already pending for this gift".to_string(),
            ));
        }

        // Pending purchases past their expiry still hold the reservation
        for stale in purchases
            .iter()
            .filter(|p| p.payment_status == PaymentStatus::Pending)
        {
            tracing::info!(purchase_id = stale.id, "Expiring stale pending purchase");
            self.apply_transition(stale, PaymentStatus::Expired).await?;
        }

        if !self.store.reserve_gift(gift.id).await? {
            return Err(PaymentError::InvalidState(
                "Gift is not available for purchase".to_string(),
            ));
        }

        let result = match self.provider {
            PaymentProvider::AbacatePay => self.create_pix_payment(&gift, request).await,
            PaymentProvider::MercadoPago => self.create_checkout_payment(&gift, request).await,
        };

        if let Err(e) = &result {
            tracing::error!(gift_id = gift.id, error = %e, "Payment creation failed, releasing gift");
            if let Err(release_err) = self.store.release_gift(gift.id).await {
                tracing::error!(gift_id = gift.id, error = %release_err, "Failed to release gift");
            }
        }

        result
    }

    async fn create_pix_payment(
        &self,
        gift: &Gift,
        request: CreatePaymentRequest,
    ) -> Result<CreatePaymentResponse, PaymentError> {
        let tax_id = clean_tax_id(&request.buyer_tax_id);

        let charge = self
            .pix
            .create_charge(&CreatePixCharge {
                amount: amount_in_cents(gift.price),
                expires_in: self.charge_expires_in,
                description: format!("Presente: {}", gift.name),
                customer: PixCustomer {
                    name: request.buyer_name.clone(),
                    cellphone: request.buyer_phone.clone(),
                    email: request.buyer_email.clone(),
                    tax_id: tax_id.clone(),
                },
                metadata: json!({
                    "giftId": gift.id,
                    "giftName": gift.name,
                    "guestId": request.guest_id,
                }),
            })
            .await?;

        let purchase = self
            .store
            .insert_pending(NewPurchase {
                gift_id: gift.id,
                guest_id: request.guest_id,
                buyer_name: request.buyer_name,
                buyer_phone: request.buyer_phone,
                buyer_email: Some(request.buyer_email),
                buyer_tax_id: Some(tax_id),
                payment_method: PaymentMethod::Pix,
                payment_id: Some(charge.id.clone()),
                pix_charge_id: Some(charge.id.clone()),
                pix_qr_code: Some(charge.br_code.clone()),
                pix_qr_code_base64: Some(charge.br_code_base64.clone()),
                expires_at: Some(charge.expires_at),
                metadata: Some(
                    json!({
                        "devMode": charge.dev_mode,
                        "platformFee": charge.platform_fee,
                    })
                    .to_string(),
                ),
            })
            .await?;

        tracing::info!(
            purchase_id = purchase.id,
            gift_id = gift.id,
            charge_id = %charge.id,
            "PIX payment created"
        );

        Ok(CreatePaymentResponse {
            purchase_id: purchase.id,
            gift_id: gift.id,
            gift_name: gift.name.clone(),
            amount: gift.price,
            payment_method: PaymentMethod::Pix,
            checkout_url: None,
            preference_id: None,
            pix_data: Some(PixPaymentData {
                qr_code: charge.br_code,
                qr_code_base64: charge.br_code_base64,
                amount: charge.amount,
                expires_at: charge.expires_at,
            }),
            available_payment_methods: vec![PaymentMethod::Pix],
        })
    }

    async fn create_checkout_payment(
        &self,
        gift: &Gift,
        request: CreatePaymentRequest,
    ) -> Result<CreatePaymentResponse, PaymentError> {
        let external_reference = format!(
            "gift-{}-{}-{}",
            gift.id,
            gift.id,
            Utc::now().timestamp_millis()
        );

        let preference = self
            .checkout
            .create_preference(&CreatePreference {
                gift_id: gift.id,
                gift_name: gift.name.clone(),
                amount: gift.price,
                buyer_name: request.buyer_name.clone(),
                buyer_email: request.buyer_email.clone(),
                buyer_phone: Some(request.buyer_phone.clone()),
                buyer_tax_id: request.buyer_tax_id.clone(),
                guest_id: request.guest_id,
                binary_mode: request.binary_mode.unwrap_or(false),
                address: request.address.clone(),
                external_reference: external_reference.clone(),
            })
            .await?;

        let checkout_url = preference.checkout_url();

        let purchase = self
            .store
            .insert_pending(NewPurchase {
                gift_id: gift.id,
                guest_id: request.guest_id,
                buyer_name: request.buyer_name,
                buyer_phone: request.buyer_phone,
                buyer_email: Some(request.buyer_email),
                buyer_tax_id: Some(clean_tax_id(&request.buyer_tax_id)),
                payment_method: PaymentMethod::Pix,
                payment_id: Some(preference.id.clone()),
                pix_charge_id: None,
                pix_qr_code: None,
                pix_qr_code_base64: None,
                expires_at: None,
                metadata: Some(
                    json!({
                        "checkoutUrl": checkout_url,
                        "externalReference": external_reference,
                    })
                    .to_string(),
                ),
            })
            .await?;

        tracing::info!(
            purchase_id = purchase.id,
            gift_id = gift.id,
            preference_id = %preference.id,
            "Checkout payment created"
        );

        Ok(CreatePaymentResponse {
            purchase_id: purchase.id,
            gift_id: gift.id,
            gift_name: gift.name.clone(),
            amount: gift.price,
            payment_method: PaymentMethod::Pix,
            checkout_url: Some(checkout_url),
            preference_id: Some(preference.id),
            pix_data: None,
            available_payment_methods: vec![PaymentMethod::Pix, PaymentMethod::Card],
        })
    }

    /// Poll the PIX provider for a pending purchase.
    ///
    /// Provider failures are logged and the stored purchase is returned.
    pub async fn check_payment_status(&self, purchase_id: i32) -> Result<StatusCheck, PaymentError> {
        let purchase = self.require_purchase(purchase_id).await?;

        if purchase.payment_status.is_terminal() {
            return Ok(StatusCheck {
                purchase,
                needs_update: false,
            });
        }

        let Some(charge_id) = purchase.pix_charge_id.clone() else {
            return Ok(StatusCheck {
                purchase,
                needs_update: false,
            });
        };

        let check = match self.pix.check_charge(&charge_id).await {
            Ok(check) => check,
            Err(e) => {
                tracing::warn!(purchase_id, charge_id = %charge_id, error = %e, "PIX status check failed");
                return Ok(StatusCheck {
                    purchase,
                    needs_update: false,
                });
            }
        };

        let target = match check.status {
            PixChargeStatus::Paid => PaymentStatus::Paid,
            PixChargeStatus::Expired => PaymentStatus::Expired,
            PixChargeStatus::Pending => {
                return Ok(StatusCheck {
                    purchase,
                    needs_update: false,
                })
            }
        };

        let outcome = self.apply_transition(&purchase, target).await?;
        let needs_update = outcome.is_transition();
        let purchase = self.require_purchase(purchase_id).await?;

        Ok(StatusCheck {
            purchase,
            needs_update,
        })
    }

    /// Cancel a pending purchase and free its gift
    pub async fn cancel_payment(&self, purchase_id: i32) -> Result<Purchase, PaymentError> {
        let purchase = self.require_purchase(purchase_id).await?;

        if purchase.payment_status != PaymentStatus::Pending {
            return Err(PaymentError::InvalidState(
                "Only pending payments can be cancelled".to_string(),
            ));
        }

        if !self
            .apply_transition(&purchase, PaymentStatus::Cancelled)
            .await?
            .is_transition()
        {
            return Err(PaymentError::InvalidState(
                "Only pending payments can be cancelled".to_string(),
            ));
        }

        tracing::info!(purchase_id, gift_id = purchase.gift_id, "Payment cancelled");
        self.require_purchase(purchase_id).await
    }

    /// Mark a PIX charge as paid at the provider, dev mode only
    pub async fn simulate_payment(&self, purchase_id: i32) -> Result<Purchase, PaymentError> {
        if !self.pix.is_dev_mode() {
            return Err(ProviderError::DevModeOnly.into());
        }

        let purchase = self.require_purchase(purchase_id).await?;

        if purchase.payment_status != PaymentStatus::Pending {
            return Err(PaymentError::InvalidState(
                "Only pending payments can be simulated".to_string(),
            ));
        }
        let charge_id = purchase.pix_charge_id.clone().ok_or_else(|| {
            PaymentError::InvalidState("Purchase has no PIX charge".to_string())
        })?;

        self.pix.simulate_payment(&charge_id).await?;
        self.apply_transition(&purchase, PaymentStatus::Paid).await?;

        tracing::info!(purchase_id, charge_id = %charge_id, "Simulated PIX payment");
        self.require_purchase(purchase_id).await
    }

    pub async fn list_purchases(
        &self,
        filter: &PurchaseFilter,
    ) -> Result<Vec<PurchaseWithGift>, PaymentError> {
        let purchases = self.store.list_purchases(filter).await?;

        let mut gifts: HashMap<i32, Option<Gift>> = HashMap::new();
        let mut result = Vec::with_capacity(purchases.len());
        for purchase in purchases {
            let gift = match gifts.get(&purchase.gift_id) {
                Some(gift) => gift.clone(),
                None => {
                    let gift = self.store.get_gift(purchase.gift_id).await?;
                    gifts.insert(purchase.gift_id, gift.clone());
                    gift
                }
            };
            result.push(PurchaseWithGift { purchase, gift });
        }

        Ok(result)
    }

    pub async fn get_purchase_with_gift(
        &self,
        purchase_id: i32,
    ) -> Result<PurchaseWithGift, PaymentError> {
        let purchase = self.require_purchase(purchase_id).await?;
        let gift = self.store.get_gift(purchase.gift_id).await?;
        Ok(PurchaseWithGift { purchase, gift })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::store::MemoryPurchaseStore;
    use crate::payments::test_support::{gift, pix_charge, purchase_request};
    use crate::providers::{MockCheckoutGateway, MockPixGateway, PixChargeCheck, Preference};
    use chrono::Duration;

    fn service(
        store: Arc<MemoryPurchaseStore>,
        pix: MockPixGateway,
        checkout: MockCheckoutGateway,
        provider: PaymentProvider,
    ) -> PaymentService {
        PaymentService::new(store, Arc::new(pix), Arc::new(checkout), provider, 3600)
    }

    #[test]
    fn test_amount_in_cents() {
        assert_eq!(amount_in_cents(Decimal::new(15990, 2)), 15990);
        assert_eq!(amount_in_cents(Decimal::new(1005, 1)), 10050);
        assert_eq!(amount_in_cents(Decimal::new(200, 0)), 20000);
    }

    #[tokio::test]
    async fn test_create_pix_payment_reserves_gift() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(7, true)).await;

        let mut pix = MockPixGateway::new();
        pix.expect_create_charge()
            .withf(|req| req.amount == 15000 && req.customer.tax_id == "12345678909")
            .times(1)
            .returning(|_| Ok(pix_charge("pix_char_7")));

        let svc = service(
            store.clone(),
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        let response = svc.create_payment(purchase_request(7)).await.unwrap();

        assert_eq!(response.gift_id, 7);
        assert_eq!(response.payment_method, PaymentMethod::Pix);
        assert!(response.pix_data.is_some());
        assert!(!store.gift(7).await.unwrap().available);

        let purchase = store.get_purchase(response.purchase_id).await.unwrap().unwrap();
        assert_eq!(purchase.payment_status, PaymentStatus::Pending);
        assert_eq!(purchase.pix_charge_id.as_deref(), Some("pix_char_7"));
        assert_eq!(purchase.payment_id.as_deref(), Some("pix_char_7"));
    }

    #[tokio::test]
    async fn test_second_creation_rejected_while_pending() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(7, true)).await;

        let mut pix = MockPixGateway::new();
        pix.expect_create_charge()
            .times(1)
            .returning(|_| Ok(pix_charge("pix_char_7")));

        let svc = service(
            store.clone(),
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        svc.create_payment(purchase_request(7)).await.unwrap();

        let err = svc.create_payment(purchase_request(7)).await.unwrap_err();
        assert!(matches!(&err, PaymentError::InvalidState(msg) if msg.contains("already pending")));
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn test_provider_failure_releases_gift() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(3, true)).await;

        let mut pix = MockPixGateway::new();
        pix.expect_create_charge().returning(|_| {
            Err(ProviderError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        });

        let svc = service(
            store.clone(),
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        let err = svc.create_payment(purchase_request(3)).await.unwrap_err();

        assert!(matches!(err, PaymentError::Provider(_)));
        assert!(store.gift(3).await.unwrap().available);
        assert_eq!(store.purchase_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_and_unavailable_gift() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(5, false)).await;

        let svc = service(
            store,
            MockPixGateway::new(),
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );

        assert!(matches!(
            svc.create_payment(purchase_request(99)).await,
            Err(PaymentError::NotFound(_))
        ));
        assert!(matches!(
            svc.create_payment(purchase_request(5)).await,
            Err(PaymentError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_create_checkout_payment() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(42, true)).await;

        let mut checkout = MockCheckoutGateway::new();
        checkout
            .expect_create_preference()
            .withf(|req| req.external_reference.starts_with("gift-42-42-"))
            .times(1)
            .returning(|req| {
                Ok(Preference {
                    id: "pref-42".to_string(),
                    init_point: Some("https://checkout.test/pref-42".to_string()),
                    sandbox_init_point: None,
                    external_reference: Some(req.external_reference.clone()),
                })
            });

        let svc = service(
            store.clone(),
            MockPixGateway::new(),
            checkout,
            PaymentProvider::MercadoPago,
        );
        let response = svc.create_payment(purchase_request(42)).await.unwrap();

        assert_eq!(response.preference_id.as_deref(), Some("pref-42"));
        assert_eq!(
            response.checkout_url.as_deref(),
            Some("https://checkout.test/pref-42")
        );
        assert_eq!(response.available_payment_methods.len(), 2);

        let purchase = store.get_purchase(response.purchase_id).await.unwrap().unwrap();
        assert_eq!(purchase.payment_id.as_deref(), Some("pref-42"));
        assert!(purchase.pix_charge_id.is_none());
        assert!(purchase.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_stale_pending_purchase_is_expired_on_create() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(8, false)).await;

        let mut stale = crate::payments::test_support::pending_purchase(1, 8);
        stale.pix_charge_id = Some("pix_old".to_string());
        stale.expires_at = Some(Utc::now() - Duration::minutes(5));
        store.insert_purchase(stale).await;

        let mut pix = MockPixGateway::new();
        pix.expect_create_charge()
            .returning(|_| Ok(pix_charge("pix_new")));

        let svc = service(
            store.clone(),
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        let response = svc.create_payment(purchase_request(8)).await.unwrap();

        assert_ne!(response.purchase_id, 1);
        let old = store.get_purchase(1).await.unwrap().unwrap();
        assert_eq!(old.payment_status, PaymentStatus::Expired);
    }

    #[tokio::test]
    async fn test_check_status_applies_paid() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(2, false)).await;
        let mut purchase = crate::payments::test_support::pending_purchase(10, 2);
        purchase.pix_charge_id = Some("pix_char_10".to_string());
        store.insert_purchase(purchase).await;

        let mut pix = MockPixGateway::new();
        pix.expect_check_charge()
            .withf(|id| id == "pix_char_10")
            .returning(|_| {
                Ok(PixChargeCheck {
                    status: PixChargeStatus::Paid,
                    expires_at: None,
                })
            });

        let svc = service(
            store.clone(),
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        let check = svc.check_payment_status(10).await.unwrap();

        assert!(check.needs_update);
        assert_eq!(check.purchase.payment_status, PaymentStatus::Paid);
        assert!(!store.gift(2).await.unwrap().available);
    }

    #[tokio::test]
    async fn test_check_status_applies_expired() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(6, false)).await;
        let mut purchase = crate::payments::test_support::pending_purchase(12, 6);
        purchase.pix_charge_id = Some("pix_char_12".to_string());
        store.insert_purchase(purchase).await;

        let mut pix = MockPixGateway::new();
        pix.expect_check_charge()
            .withf(|id| id == "pix_char_12")
            .returning(|_| {
                Ok(PixChargeCheck {
                    status: PixChargeStatus::Expired,
                    expires_at: None,
                })
            });

        let svc = service(
            store.clone(),
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        let check = svc.check_payment_status(12).await.unwrap();

        assert!(check.needs_update);
        assert_eq!(check.purchase.payment_status, PaymentStatus::Expired);
        assert!(store.gift(6).await.unwrap().available);
    }

    #[tokio::test]
    async fn test_check_status_survives_provider_error() {
        let store = Arc::new(MemoryPurchaseStore::new());
        let mut purchase = crate::payments::test_support::pending_purchase(11, 2);
        purchase.pix_charge_id = Some("pix_char_11".to_string());
        store.insert_purchase(purchase).await;

        let mut pix = MockPixGateway::new();
        pix.expect_check_charge()
            .returning(|_| Err(ProviderError::NotFound));

        let svc = service(
            store,
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        let check = svc.check_payment_status(11).await.unwrap();

        assert!(!check.needs_update);
        assert_eq!(check.purchase.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_payment() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(4, false)).await;
        store
            .insert_purchase(crate::payments::test_support::pending_purchase(20, 4))
            .await;

        let svc = service(
            store.clone(),
            MockPixGateway::new(),
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );

        let cancelled = svc.cancel_payment(20).await.unwrap();
        assert_eq!(cancelled.payment_status, PaymentStatus::Cancelled);
        assert!(store.gift(4).await.unwrap().available);

        assert!(matches!(
            svc.cancel_payment(20).await,
            Err(PaymentError::InvalidState(_))
        ));
        assert!(matches!(
            svc.cancel_payment(404).await,
            Err(PaymentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_simulate_requires_dev_mode() {
        let store = Arc::new(MemoryPurchaseStore::new());

        let mut pix = MockPixGateway::new();
        pix.expect_is_dev_mode().return_const(false);

        let svc = service(
            store,
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        assert!(matches!(
            svc.simulate_payment(1).await,
            Err(PaymentError::Provider(ProviderError::DevModeOnly))
        ));
    }

    #[tokio::test]
    async fn test_simulate_payment_marks_paid() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(6, false)).await;
        let mut purchase = crate::payments::test_support::pending_purchase(30, 6);
        purchase.pix_charge_id = Some("pix_char_30".to_string());
        store.insert_purchase(purchase).await;

        let mut pix = MockPixGateway::new();
        pix.expect_is_dev_mode().return_const(true);
        pix.expect_simulate_payment()
            .withf(|id| id == "pix_char_30")
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(
            store,
            pix,
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );
        let purchase = svc.simulate_payment(30).await.unwrap();
        assert_eq!(purchase.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_list_purchases_filters_and_joins_gift() {
        let store = Arc::new(MemoryPurchaseStore::new());
        store.insert_gift(gift(1, false)).await;
        store
            .insert_purchase(crate::payments::test_support::pending_purchase(1, 1))
            .await;
        let mut paid = crate::payments::test_support::pending_purchase(2, 1);
        paid.payment_status = PaymentStatus::Paid;
        store.insert_purchase(paid).await;

        let svc = service(
            store,
            MockPixGateway::new(),
            MockCheckoutGateway::new(),
            PaymentProvider::AbacatePay,
        );

        let all = svc.list_purchases(&PurchaseFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.gift.is_some()));

        let paid_only = svc
            .list_purchases(&PurchaseFilter {
                status: Some(PaymentStatus::Paid),
                gift_id: None,
            })
            .await
            .unwrap();
        assert_eq!(paid_only.len(), 1);
        assert_eq!(paid_only[0].purchase.id, 2);

        let detail = svc.get_purchase_with_gift(2).await.unwrap();
        assert_eq!(detail.gift.map(|g| g.id), Some(1));
    }
}
