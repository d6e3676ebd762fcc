//! AbacatePay PIX QR-code client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{read_json, CreatePixCharge, PixCharge, PixChargeCheck, PixGateway, ProviderError};
use crate::config::AbacatePayConfig;

/// Every AbacatePay response is wrapped as `{data, error}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, ProviderError> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Err(ProviderError::InvalidResponse(error));
        }
        self.data
            .ok_or_else(|| ProviderError::InvalidResponse("missing data".to_string()))
    }
}

#[derive(Clone)]
pub struct AbacatePayClient {
    http: Client,
    base_url: String,
    api_key: String,
    dev_mode: bool,
}

impl AbacatePayClient {
    pub fn new(config: &AbacatePayConfig, timeout_secs: u64) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            dev_mode: config.dev_mode,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PixGateway for AbacatePayClient {
    async fn create_charge(&self, request: &CreatePixCharge) -> Result<PixCharge, ProviderError> {
        let resp = self
            .http
            .post(self.url("/pixQrCode/create"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let charge = read_json::<Envelope<PixCharge>>(resp).await?.into_data()?;
        tracing::info!(charge_id = %charge.id, amount = charge.amount, "PIX charge created");
        Ok(charge)
    }

    async fn check_charge(&self, charge_id: &str) -> Result<PixChargeCheck, ProviderError> {
        let resp = self
            .http
            .get(self.url("/pixQrCode/check"))
            .query(&[("id", charge_id)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        read_json::<Envelope<PixChargeCheck>>(resp).await?.into_data()
    }

    async fn simulate_payment(&self, charge_id: &str) -> Result<(), ProviderError> {
        if !self.dev_mode {
            return Err(ProviderError::DevModeOnly);
        }

        let resp = self
            .http
            .post(self.url("/pixQrCode/simulate-payment"))
            .query(&[("id", charge_id)])
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "metadata": {} }))
            .send()
            .await?;

        read_json::<Envelope<serde_json::Value>>(resp)
            .await?
            .into_data()
            .map(|_| ())
    }

    fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_error_wins_over_data() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"data": {"status": "PAID"}, "error": "boom"}"#).unwrap();
        assert!(matches!(
            envelope.into_data(),
            Err(ProviderError::InvalidResponse(msg)) if msg == "boom"
        ));
    }

    #[test]
    fn test_envelope_missing_data() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"data": null, "error": null}"#).unwrap();
        assert!(envelope.into_data().is_err());
    }

    #[tokio::test]
    async fn test_simulate_rejected_outside_dev_mode() {
        let config = AbacatePayConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: "key".to_string(),
            dev_mode: false,
            webhook_secret: None,
            charge_expires_in: 3600,
        };
        let client = AbacatePayClient::new(&config, 1).unwrap();
        assert!(matches!(
            client.simulate_payment("pix_char_1").await,
            Err(ProviderError::DevModeOnly)
        ));
    }
}
