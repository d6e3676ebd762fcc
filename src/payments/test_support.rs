//! Fixtures shared by the payment unit tests

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use super::{CreatePaymentRequest, PaymentMethod, PaymentStatus, Purchase};
use crate::gifts::Gift;
use crate::providers::{PixCharge, PixChargeStatus};

/// Gift priced at 150.00
pub fn gift(id: i32, available: bool) -> Gift {
    Gift {
        id,
        name: format!("Gift {}", id),
        description: None,
        image_url: None,
        price: Decimal::new(15000, 2),
        available,
        created_at: Utc::now(),
    }
}

pub fn pending_purchase(id: i32, gift_id: i32) -> Purchase {
    let now = Utc::now();
    Purchase {
        id,
        gift_id,
        guest_id: None,
        buyer_name: "Ana Lima".to_string(),
        buyer_phone: "11999999999".to_string(),
        buyer_email: Some("ana@example.com".to_string()),
        buyer_tax_id: Some("12345678909".to_string()),
        payment_method: PaymentMethod::Pix,
        payment_status: PaymentStatus::Pending,
        payment_id: None,
        pix_charge_id: None,
        pix_qr_code: None,
        pix_qr_code_base64: None,
        expires_at: None,
        metadata: None,
        purchased_at: now - Duration::minutes(10),
        updated_at: now - Duration::minutes(10),
    }
}

pub fn purchase_request(gift_id: i32) -> CreatePaymentRequest {
    CreatePaymentRequest {
        gift_id,
        buyer_name: "Maria Souza".to_string(),
        buyer_phone: "11987654321".to_string(),
        buyer_email: "maria@example.com".to_string(),
        buyer_tax_id: "123.456.789-09".to_string(),
        guest_id: None,
        binary_mode: None,
        address: None,
    }
}

pub fn pix_charge(id: &str) -> PixCharge {
    PixCharge {
        id: id.to_string(),
        amount: 15000,
        status: PixChargeStatus::Pending,
        dev_mode: true,
        br_code: "00020101021226".to_string(),
        br_code_base64: "data:image/png;base64,AAAA".to_string(),
        platform_fee: 80,
        expires_at: Utc::now() + Duration::hours(1),
    }
}
