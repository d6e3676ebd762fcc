//! Payment provider clients
//!
//! Two integrations are supported, one active per deployment:
//! - [`AbacatePayClient`]: PIX QR-code charges, reconciled by charge id.
//! - [`MercadoPagoClient`]: checkout preferences, reconciled by preference id
//!   or external reference.
//!
//! Both sit behind a small trait so the payment service can be exercised
//! without network access.

mod abacatepay;
mod mercadopago;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payments::{BuyerAddress, PaymentMethod};

pub use abacatepay::AbacatePayClient;
pub use mercadopago::MercadoPagoClient;

/// Provider call failures
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider api error status={status} body={body}")]
    Api { status: u16, body: String },

    #[error("resource not found at provider")]
    NotFound,

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("payment simulation is only allowed in dev mode")]
    DevModeOnly,
}

/// Shared response handling: 404 maps to `NotFound`, other failures keep the body
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = resp.status();
    let body = resp.text().await?;

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound);
    }
    if !status.is_success() {
        return Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<T>(&body)
        .map_err(|e| ProviderError::InvalidResponse(format!("{e}; body={body}")))
}

// ===== PIX (charge-id based) =====

/// Charge status vocabulary of the PIX provider
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixChargeStatus {
    Pending,
    Paid,
    Expired,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PixCustomer {
    pub name: String,
    pub cellphone: String,
    pub email: String,
    pub tax_id: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePixCharge {
    /// Amount in cents
    pub amount: i64,
    /// Lifetime in seconds
    pub expires_in: i64,
    pub description: String,
    pub customer: PixCustomer,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PixCharge {
    pub id: String,
    pub amount: i64,
    pub status: PixChargeStatus,
    #[serde(default)]
    pub dev_mode: bool,
    pub br_code: String,
    pub br_code_base64: String,
    #[serde(default)]
    pub platform_fee: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PixChargeCheck {
    pub status: PixChargeStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PixGateway: Send + Sync {
    async fn create_charge(&self, request: &CreatePixCharge) -> Result<PixCharge, ProviderError>;

    async fn check_charge(&self, charge_id: &str) -> Result<PixChargeCheck, ProviderError>;

    async fn simulate_payment(&self, charge_id: &str) -> Result<(), ProviderError>;

    fn is_dev_mode(&self) -> bool;
}

// ===== Checkout (preference based) =====

/// Input for a checkout preference
#[derive(Debug, Clone)]
pub struct CreatePreference {
    pub gift_id: i32,
    pub gift_name: String,
    pub amount: Decimal,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    pub buyer_tax_id: String,
    pub guest_id: Option<i32>,
    pub binary_mode: bool,
    pub address: Option<BuyerAddress>,
    /// `gift-{giftId}-...`, echoed back on payments
    pub external_reference: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Preference {
    pub id: String,
    pub init_point: Option<String>,
    pub sandbox_init_point: Option<String>,
    pub external_reference: Option<String>,
}

impl Preference {
    pub fn checkout_url(&self) -> String {
        self.init_point
            .clone()
            .or_else(|| self.sandbox_init_point.clone())
            .unwrap_or_default()
    }
}

/// Payment object as reported by the checkout provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderPayment {
    #[serde(deserialize_with = "crate::payments::string_or_number")]
    pub id: String,
    /// `approved`, `rejected`, `cancelled`, `pending`, `in_process`, ...
    pub status: String,
    pub status_detail: Option<String>,
    pub preference_id: Option<String>,
    pub external_reference: Option<String>,
    pub payment_type_id: Option<String>,
    pub payment_method_id: Option<String>,
}

impl ProviderPayment {
    /// Method the buyer actually used, when the provider tells us
    pub fn detected_method(&self) -> Option<PaymentMethod> {
        match self.payment_type_id.as_deref() {
            Some("credit_card") | Some("debit_card") => return Some(PaymentMethod::Card),
            Some("bank_transfer") => return Some(PaymentMethod::Pix),
            _ => {}
        }
        match self.payment_method_id.as_deref() {
            Some("pix") => Some(PaymentMethod::Pix),
            _ => None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_preference(&self, request: &CreatePreference)
        -> Result<Preference, ProviderError>;

    async fn get_preference(&self, preference_id: &str) -> Result<Preference, ProviderError>;

    async fn get_payment(&self, payment_id: &str) -> Result<ProviderPayment, ProviderError>;
}
