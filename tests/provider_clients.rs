//! Provider HTTP client tests against a mock server

use httpmock::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use wedding_server::config::{AbacatePayConfig, MercadoPagoConfig};
use wedding_server::payments::PaymentMethod;
use wedding_server::providers::{
    AbacatePayClient, CheckoutGateway, CreatePixCharge, CreatePreference, MercadoPagoClient,
    PixChargeStatus, PixCustomer, PixGateway, ProviderError,
};

fn abacatepay(server: &MockServer, dev_mode: bool) -> AbacatePayClient {
    let config = AbacatePayConfig {
        base_url: server.base_url(),
        api_key: "abc_test_key".to_string(),
        dev_mode,
        webhook_secret: None,
        charge_expires_in: 3600,
    };
    AbacatePayClient::new(&config, 5).unwrap()
}

fn mercadopago(server: &MockServer) -> MercadoPagoClient {
    let config = MercadoPagoConfig {
        base_url: server.base_url(),
        access_token: "TEST-token".to_string(),
        notification_base_url: "https://casamento.example.com".to_string(),
        success_url: "https://casamento.example.com/payment/success".to_string(),
        failure_url: "https://casamento.example.com/payment/failure".to_string(),
        pending_url: "https://casamento.example.com/payment/pending".to_string(),
    };
    MercadoPagoClient::new(&config, 5).unwrap()
}

fn charge_request() -> CreatePixCharge {
    CreatePixCharge {
        amount: 15000,
        expires_in: 3600,
        description: "Presente: Jogo de panelas".to_string(),
        customer: PixCustomer {
            name: "Maria Souza".to_string(),
            cellphone: "11987654321".to_string(),
            email: "maria@example.com".to_string(),
            tax_id: "12345678909".to_string(),
        },
        metadata: json!({ "giftId": 7 }),
    }
}

fn preference_request() -> CreatePreference {
    CreatePreference {
        gift_id: 7,
        gift_name: "Jogo de panelas".to_string(),
        amount: Decimal::new(35990, 2),
        buyer_name: "Maria Souza".to_string(),
        buyer_email: "maria@example.com".to_string(),
        buyer_phone: Some("11987654321".to_string()),
        buyer_tax_id: "123.456.789-09".to_string(),
        guest_id: None,
        binary_mode: false,
        address: None,
        external_reference: "gift-7-42-1717000000000".to_string(),
    }
}

#[tokio::test]
async fn test_create_pix_charge() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/pixQrCode/create")
                .header("authorization", "Bearer abc_test_key")
                .json_body_partial(r#"{"amount": 15000, "expiresIn": 3600}"#);
            then.status(200).json_body(json!({
                "data": {
                    "id": "pix_char_123",
                    "amount": 15000,
                    "status": "PENDING",
                    "devMode": true,
                    "brCode": "00020101021226",
                    "brCodeBase64": "data:image/png;base64,AAAA",
                    "platformFee": 80,
                    "expiresAt": "2030-01-01T12:00:00.000Z"
                },
                "error": null
            }));
        })
        .await;

    let charge = abacatepay(&server, true)
        .create_charge(&charge_request())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(charge.id, "pix_char_123");
    assert_eq!(charge.status, PixChargeStatus::Pending);
    assert_eq!(charge.br_code, "00020101021226");
}

#[tokio::test]
async fn test_check_pix_charge() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pixQrCode/check")
                .query_param("id", "pix_char_123");
            then.status(200).json_body(json!({
                "data": { "status": "PAID", "expiresAt": "2030-01-01T12:00:00.000Z" },
                "error": null
            }));
        })
        .await;

    let check = abacatepay(&server, false)
        .check_charge("pix_char_123")
        .await
        .unwrap();
    assert_eq!(check.status, PixChargeStatus::Paid);
}

#[tokio::test]
async fn test_pix_api_error_keeps_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/pixQrCode/create");
            then.status(401).body("invalid api key");
        })
        .await;

    let err = abacatepay(&server, false)
        .create_charge(&charge_request())
        .await
        .unwrap_err();

    match err {
        ProviderError::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_simulate_payment_in_dev_mode() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/pixQrCode/simulate-payment")
                .query_param("id", "pix_char_123");
            then.status(200)
                .json_body(json!({ "data": { "status": "PAID" }, "error": null }));
        })
        .await;

    abacatepay(&server, true)
        .simulate_payment("pix_char_123")
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_preference() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/checkout/preferences")
                .header("authorization", "Bearer TEST-token")
                .json_body_partial(
                    r#"{
                        "external_reference": "gift-7-42-1717000000000",
                        "notification_url": "https://casamento.example.com/api/payments/webhook/mercadopago"
                    }"#,
                );
            then.status(201).json_body(json!({
                "id": "123-pref",
                "init_point": "https://www.mercadopago.com.br/checkout/v1/redirect?pref_id=123-pref",
                "sandbox_init_point": null,
                "external_reference": "gift-7-42-1717000000000"
            }));
        })
        .await;

    let preference = mercadopago(&server)
        .create_preference(&preference_request())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(preference.id, "123-pref");
    assert!(preference.checkout_url().ends_with("pref_id=123-pref"));
}

#[tokio::test]
async fn test_get_payment_with_numeric_id() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/987654");
            then.status(200).json_body(json!({
                "id": 987654,
                "status": "approved",
                "status_detail": "accredited",
                "preference_id": "123-pref",
                "external_reference": "gift-7-42-1717000000000",
                "payment_type_id": "credit_card",
                "payment_method_id": "visa"
            }));
        })
        .await;

    let payment = mercadopago(&server).get_payment("987654").await.unwrap();
    assert_eq!(payment.id, "987654");
    assert_eq!(payment.status, "approved");
    assert_eq!(payment.detected_method(), Some(PaymentMethod::Card));
}

#[tokio::test]
async fn test_unknown_payment_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/123-pref");
            then.status(404)
                .json_body(json!({ "message": "Payment not found", "status": 404 }));
        })
        .await;

    let err = mercadopago(&server).get_payment("123-pref").await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound));
}

#[tokio::test]
async fn test_get_preference() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/checkout/preferences/123-pref");
            then.status(200).json_body(json!({
                "id": "123-pref",
                "init_point": null,
                "sandbox_init_point": "https://sandbox.mercadopago.com.br/checkout?pref_id=123-pref",
                "external_reference": "gift-7-42-1717000000000"
            }));
        })
        .await;

    let preference = mercadopago(&server)
        .get_preference("123-pref")
        .await
        .unwrap();
    assert_eq!(
        preference.external_reference.as_deref(),
        Some("gift-7-42-1717000000000")
    );
    assert!(preference.checkout_url().contains("sandbox"));
}
