//! Purchase models, request DTOs and provider webhook payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::types::chrono::{DateTime, Utc};
use validator::{Validate, ValidationError};

use crate::gifts::Gift;

/// Lifecycle of a purchase; every state but `Pending` is terminal
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Expired,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Gift availability after a purchase lands in this status
    pub fn gift_available(self) -> bool {
        matches!(
            self,
            PaymentStatus::Failed | PaymentStatus::Expired | PaymentStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Card,
}

/// One attempt to buy a gift
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: i32,
    pub gift_id: i32,
    pub guest_id: Option<i32>,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: Option<String>,
    pub buyer_tax_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Provider-assigned id (PIX charge id or checkout preference id)
    pub payment_id: Option<String>,
    pub pix_charge_id: Option<String>,
    pub pix_qr_code: Option<String>,
    pub pix_qr_code_base64: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Opaque provider JSON
    pub metadata: Option<String>,
    pub purchased_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    /// Pending and not past its provider expiry.
    ///
    /// Checkout preferences carry no expiry, so a pending one always blocks.
    pub fn blocks_new_purchase(&self, now: DateTime<Utc>) -> bool {
        self.payment_status == PaymentStatus::Pending
            && self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// Fields written when a pending purchase is first persisted
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub gift_id: i32,
    pub guest_id: Option<i32>,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: Option<String>,
    pub buyer_tax_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_id: Option<String>,
    pub pix_charge_id: Option<String>,
    pub pix_qr_code: Option<String>,
    pub pix_qr_code_base64: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: Option<String>,
}

/// Filters for the admin purchase listing
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseFilter {
    pub status: Option<PaymentStatus>,
    pub gift_id: Option<i32>,
}

/// Purchase joined with its gift
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseWithGift {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub gift: Option<Gift>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BuyerAddress {
    pub street: Option<String>,
    pub number: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Request DTO for starting a gift payment
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[validate(range(min = 1, message = "giftId must be positive"))]
    pub gift_id: i32,
    #[validate(length(min = 3, message = "Name must have at least 3 characters"))]
    pub buyer_name: String,
    #[validate(length(min = 10, message = "Invalid phone number"))]
    pub buyer_phone: String,
    #[validate(email(message = "Invalid email"))]
    pub buyer_email: String,
    #[validate(custom = "validate_tax_id")]
    pub buyer_tax_id: String,
    #[validate(range(min = 1, message = "guestId must be positive"))]
    pub guest_id: Option<i32>,
    pub binary_mode: Option<bool>,
    pub address: Option<BuyerAddress>,
}

/// Strip everything but digits from a CPF/CNPJ
pub fn clean_tax_id(tax_id: &str) -> String {
    tax_id.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn validate_tax_id(tax_id: &str) -> Result<(), ValidationError> {
    match clean_tax_id(tax_id).len() {
        11 | 14 => Ok(()),
        _ => {
            let mut err = ValidationError::new("tax_id");
            err.message = Some("CPF must have 11 digits or CNPJ 14 digits".into());
            Err(err)
        }
    }
}

/// QR code data handed back for PIX charges
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentData {
    pub qr_code: String,
    pub qr_code_base64: String,
    /// Charged amount in cents
    pub amount: i64,
    pub expires_at: DateTime<Utc>,
}

/// Response DTO for payment creation
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub purchase_id: i32,
    pub gift_id: i32,
    pub gift_name: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_data: Option<PixPaymentData>,
    pub available_payment_methods: Vec<PaymentMethod>,
}

/// Result of a status poll
#[derive(Debug, Clone)]
pub struct StatusCheck {
    pub purchase: Purchase,
    /// Whether the poll moved the purchase to a new status
    pub needs_update: bool,
}

/// Outcome of reconciling one provider signal against a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub purchase_id: i32,
    pub status: ReconcileStatus,
}

impl ReconcileOutcome {
    pub fn is_transition(&self) -> bool {
        matches!(self.status, ReconcileStatus::Transitioned(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// The purchase moved to this status
    Transitioned(PaymentStatus),
    /// The purchase was already terminal, nothing written
    AlreadyProcessed,
    /// Provisional notification matched a preference, nothing written
    NotificationReceived,
    /// Provider status reported without a transition
    Reported(String),
}

impl ReconcileStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReconcileStatus::Transitioned(status) => status.as_str(),
            ReconcileStatus::AlreadyProcessed => "already_processed",
            ReconcileStatus::NotificationReceived => "notification_received",
            ReconcileStatus::Reported(raw) => raw,
        }
    }
}

impl Serialize for ReconcileStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// PIX provider webhook body: `{event, data: {id, status}}`
#[derive(Debug, Deserialize, Clone)]
pub struct PixWebhookPayload {
    pub event: String,
    pub data: PixWebhookData,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PixWebhookData {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

/// Checkout provider notification, normalised from body or query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutNotification {
    /// `payment`, `merchant_order`, ...
    pub kind: String,
    /// Provider payment id (sometimes a preference id)
    pub id: String,
}

/// Body form: `{type, data: {id}}`
#[derive(Debug, Deserialize, Default)]
pub struct CheckoutNotificationBody {
    #[serde(rename = "type", alias = "topic")]
    pub kind: Option<String>,
    pub data: Option<CheckoutNotificationData>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutNotificationData {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Query form: `?topic=payment&id=123` or `?type=payment&data.id=123`
#[derive(Debug, Deserialize, Default)]
pub struct CheckoutNotificationQuery {
    pub topic: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "data.id")]
    pub data_id: Option<String>,
}

impl CheckoutNotificationBody {
    pub fn into_notification(self) -> Option<CheckoutNotification> {
        match (self.kind, self.data) {
            (Some(kind), Some(data)) if !kind.is_empty() && !data.id.is_empty() => {
                Some(CheckoutNotification { kind, id: data.id })
            }
            _ => None,
        }
    }
}

impl CheckoutNotificationQuery {
    pub fn into_notification(self) -> Option<CheckoutNotification> {
        let kind = self.topic.or(self.kind).filter(|k| !k.is_empty())?;
        let id = self.id.or(self.data_id).filter(|id| !id.is_empty())?;
        Some(CheckoutNotification { kind, id })
    }
}

/// Provider ids arrive as either JSON strings or numbers
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample_request() -> CreatePaymentRequest {
        CreatePaymentRequest {
            gift_id: 7,
            buyer_name: "Maria Souza".to_string(),
            buyer_phone: "11987654321".to_string(),
            buyer_email: "maria@example.com".to_string(),
            buyer_tax_id: "123.456.789-09".to_string(),
            guest_id: None,
            binary_mode: None,
            address: None,
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!PaymentStatus::Pending.is_terminal());
        for status in [
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Expired,
            PaymentStatus::Cancelled,
        ] {
            assert!(status.is_terminal(), "{:?} should be terminal", status);
        }
        assert!(!PaymentStatus::Paid.gift_available());
        assert!(PaymentStatus::Expired.gift_available());
    }

    #[test]
    fn test_create_payment_validation() {
        let mut request = sample_request();
        assert!(request.validate().is_ok());

        request.buyer_tax_id = "12.345.678/0001-95".to_string();
        assert!(request.validate().is_ok());

        request.buyer_tax_id = "1234".to_string();
        assert!(request.validate().is_err());

        let mut request = sample_request();
        request.buyer_email = "not-an-email".to_string();
        assert!(request.validate().is_err());

        let mut request = sample_request();
        request.gift_id = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_clean_tax_id() {
        assert_eq!(clean_tax_id("123.456.789-09"), "12345678909");
    }

    #[test]
    fn test_reconcile_status_serialization() {
        let outcome = ReconcileOutcome {
            purchase_id: 3,
            status: ReconcileStatus::AlreadyProcessed,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"purchaseId": 3, "status": "already_processed"})
        );
        assert_eq!(
            ReconcileStatus::Transitioned(PaymentStatus::Paid).as_str(),
            "paid"
        );
    }

    #[test]
    fn test_checkout_notification_from_body_with_numeric_id() {
        let body: CheckoutNotificationBody =
            serde_json::from_value(json!({"type": "payment", "data": {"id": 123456789}})).unwrap();
        assert_eq!(
            body.into_notification(),
            Some(CheckoutNotification {
                kind: "payment".to_string(),
                id: "123456789".to_string()
            })
        );
    }

    #[test]
    fn test_checkout_notification_from_query() {
        let query = CheckoutNotificationQuery {
            topic: Some("merchant_order".to_string()),
            id: Some("42".to_string()),
            ..Default::default()
        };
        let notification = query.into_notification().unwrap();
        assert_eq!(notification.kind, "merchant_order");
        assert_eq!(notification.id, "42");

        assert!(CheckoutNotificationQuery::default().into_notification().is_none());
    }

    #[test]
    fn test_blocks_new_purchase() {
        let now = Utc::now();
        let mut purchase = Purchase {
            id: 1,
            gift_id: 1,
            guest_id: None,
            buyer_name: "Ana".to_string(),
            buyer_phone: "11999999999".to_string(),
            buyer_email: None,
            buyer_tax_id: None,
            payment_method: PaymentMethod::Pix,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            pix_charge_id: None,
            pix_qr_code: None,
            pix_qr_code_base64: None,
            expires_at: Some(now + Duration::minutes(30)),
            metadata: None,
            purchased_at: now,
            updated_at: now,
        };
        assert!(purchase.blocks_new_purchase(now));

        purchase.expires_at = Some(now - Duration::minutes(1));
        assert!(!purchase.blocks_new_purchase(now));

        purchase.expires_at = None;
        assert!(purchase.blocks_new_purchase(now));

        purchase.payment_status = PaymentStatus::Expired;
        assert!(!purchase.blocks_new_purchase(now));
    }
}
