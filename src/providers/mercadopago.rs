//! Mercado Pago checkout-preference client

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use std::time::Duration;

use super::{
    read_json, CheckoutGateway, CreatePreference, Preference, ProviderError, ProviderPayment,
};
use crate::config::MercadoPagoConfig;
use crate::payments::clean_tax_id;

#[derive(Clone)]
pub struct MercadoPagoClient {
    http: Client,
    base_url: String,
    access_token: String,
    notification_base_url: String,
    success_url: String,
    failure_url: String,
    pending_url: String,
}

/// First word and the rest; a single word fills both halves
fn split_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    match parts.next() {
        None => ("Cliente".to_string(), "Convidado".to_string()),
        Some(first) => {
            let rest = parts.collect::<Vec<_>>().join(" ");
            if rest.is_empty() {
                (first.to_string(), first.to_string())
            } else {
                (first.to_string(), rest)
            }
        }
    }
}

impl MercadoPagoClient {
    pub fn new(config: &MercadoPagoConfig, timeout_secs: u64) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            notification_base_url: config.notification_base_url.trim_end_matches('/').to_string(),
            success_url: config.success_url.clone(),
            failure_url: config.failure_url.clone(),
            pending_url: config.pending_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn preference_body(&self, request: &CreatePreference) -> Value {
        let (first_name, last_name) = split_name(&request.buyer_name);

        let phone = request
            .buyer_phone
            .as_ref()
            .map(|number| json!({ "number": number }));
        let address = request.address.as_ref().map(|address| {
            json!({
                "street_name": address.street,
                "street_number": address.number,
                "zip_code": address.zip_code,
            })
        });

        json!({
            "items": [{
                "id": format!("gift-{}", request.gift_id),
                "title": format!("Presente de casamento: {}", request.gift_name),
                "description": format!("Pagamento do presente: {}", request.gift_name),
                "quantity": 1,
                "unit_price": request.amount.to_f64().unwrap_or_default(),
                "currency_id": "BRL",
                "category_id": "others",
            }],
            "payer": {
                "name": request.buyer_name,
                "first_name": first_name,
                "last_name": last_name,
                "email": request.buyer_email,
                "phone": phone,
                "identification": {
                    "type": "CPF",
                    "number": clean_tax_id(&request.buyer_tax_id),
                },
                "address": address,
            },
            "payment_methods": {
                "excluded_payment_types": [
                    { "id": "ticket" },
                    { "id": "atm" },
                    { "id": "digital_currency" },
                    { "id": "prepaid_card" },
                ],
                "excluded_payment_methods": [],
                "installments": 6,
            },
            "binary_mode": request.binary_mode,
            "back_urls": {
                "success": self.success_url,
                "failure": self.failure_url,
                "pending": self.pending_url,
            },
            "notification_url": format!(
                "{}/api/payments/webhook/mercadopago",
                self.notification_base_url
            ),
            "metadata": {
                "giftId": request.gift_id.to_string(),
                "giftName": request.gift_name,
                "guestId": request.guest_id.map(|id| id.to_string()),
            },
            "external_reference": request.external_reference,
            "statement_descriptor": "CASAMENTO",
        })
    }
}

#[async_trait]
impl CheckoutGateway for MercadoPagoClient {
    async fn create_preference(
        &self,
        request: &CreatePreference,
    ) -> Result<Preference, ProviderError> {
        let resp = self
            .http
            .post(self.url("/checkout/preferences"))
            .bearer_auth(&self.access_token)
            .json(&self.preference_body(request))
            .send()
            .await?;

        let preference: Preference = read_json(resp).await?;
        tracing::info!(
            preference_id = %preference.id,
            external_reference = %request.external_reference,
            "Checkout preference created"
        );
        Ok(preference)
    }

    async fn get_preference(&self, preference_id: &str) -> Result<Preference, ProviderError> {
        let resp = self
            .http
            .get(self.url(&format!("/checkout/preferences/{}", preference_id)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        read_json(resp).await
    }

    async fn get_payment(&self, payment_id: &str) -> Result<ProviderPayment, ProviderError> {
        let resp = self
            .http
            .get(self.url(&format!("/v1/payments/{}", payment_id)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        read_json(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn client() -> MercadoPagoClient {
        let config = MercadoPagoConfig {
            base_url: "https://api.mercadopago.test/".to_string(),
            access_token: "TEST-token".to_string(),
            notification_base_url: "https://wedding.test/".to_string(),
            success_url: "https://wedding.test/payment/success".to_string(),
            failure_url: "https://wedding.test/payment/failure".to_string(),
            pending_url: "https://wedding.test/payment/pending".to_string(),
        };
        MercadoPagoClient::new(&config, 5).unwrap()
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("Maria da Silva"),
            ("Maria".to_string(), "da Silva".to_string())
        );
        assert_eq!(split_name("Maria"), ("Maria".to_string(), "Maria".to_string()));
        assert_eq!(
            split_name("   "),
            ("Cliente".to_string(), "Convidado".to_string())
        );
    }

    #[test]
    fn test_preference_body() {
        let request = CreatePreference {
            gift_id: 42,
            gift_name: "Jogo de panelas".to_string(),
            amount: Decimal::new(35990, 2),
            buyer_name: "Joao Pereira".to_string(),
            buyer_email: "joao@example.com".to_string(),
            buyer_phone: None,
            buyer_tax_id: "123.456.789-09".to_string(),
            guest_id: Some(3),
            binary_mode: false,
            address: None,
            external_reference: "gift-42-42-1700000000000".to_string(),
        };

        let body = client().preference_body(&request);
        assert_eq!(body["items"][0]["id"], "gift-42");
        assert_eq!(body["payer"]["identification"]["number"], "12345678909");
        assert_eq!(body["payer"]["last_name"], "Pereira");
        assert_eq!(body["items"][0]["unit_price"], 359.9);
        assert_eq!(body["payment_methods"]["installments"], 6);
        assert_eq!(
            body["notification_url"],
            "https://wedding.test/api/payments/webhook/mercadopago"
        );
        assert_eq!(body["external_reference"], "gift-42-42-1700000000000");
        assert_eq!(body["metadata"]["guestId"], "3");
        assert!(body["payer"]["phone"].is_null());
    }
}
