//! Provider signal reconciliation
//!
//! Every status change, whether it comes from a poll, a PIX webhook or a
//! checkout notification, goes through [`PaymentService::apply_transition`].
//! A purchase leaves `pending` at most once; later signals for the same
//! purchase report `already_processed` and write nothing.

use super::service::{PaymentError, PaymentService};
use super::{
    CheckoutNotification, PaymentStatus, PixWebhookPayload, Purchase, ReconcileOutcome,
    ReconcileStatus,
};
use crate::providers::{ProviderError, ProviderPayment};

const PIX_PAID_EVENT: &str = "pix.paid";
const PIX_EXPIRED_EVENT: &str = "pix.expired";

/// Gift id from an external reference shaped `gift-{giftId}-...`
pub fn parse_external_reference(reference: &str) -> Option<i32> {
    let rest = reference.strip_prefix("gift-")?;
    let (gift_id, _) = rest.split_once('-')?;
    gift_id.parse().ok()
}

/// Checkout payment status to the transition it triggers, if any
fn checkout_target(status: &str) -> Option<PaymentStatus> {
    match status {
        "approved" => Some(PaymentStatus::Paid),
        "rejected" | "cancelled" => Some(PaymentStatus::Failed),
        "expired" | "refunded" => Some(PaymentStatus::Expired),
        _ => None,
    }
}

impl PaymentService {
    /// Move a pending purchase to `target` together with its gift flip.
    pub async fn apply_transition(
        &self,
        purchase: &Purchase,
        target: PaymentStatus,
    ) -> Result<ReconcileOutcome, PaymentError> {
        if purchase.payment_status.is_terminal() {
            tracing::debug!(
                purchase_id = purchase.id,
                status = purchase.payment_status.as_str(),
                "Purchase already terminal"
            );
            return Ok(ReconcileOutcome {
                purchase_id: purchase.id,
                status: ReconcileStatus::AlreadyProcessed,
            });
        }

        let status = match self.store.transition(purchase.id, target).await? {
            Some(updated) => {
                tracing::info!(
                    purchase_id = updated.id,
                    gift_id = updated.gift_id,
                    status = target.as_str(),
                    "Purchase transitioned"
                );
                ReconcileStatus::Transitioned(target)
            }
            None => {
                tracing::info!(purchase_id = purchase.id, "Lost transition race, already processed");
                ReconcileStatus::AlreadyProcessed
            }
        };

        Ok(ReconcileOutcome {
            purchase_id: purchase.id,
            status,
        })
    }

    /// PIX provider webhook. Errors are logged and swallowed.
    pub async fn handle_pix_webhook(&self, payload: &PixWebhookPayload) -> Option<ReconcileOutcome> {
        match self.reconcile_pix_event(payload).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    event = %payload.event,
                    charge_id = %payload.data.id,
                    error = %e,
                    "Failed to process PIX webhook"
                );
                None
            }
        }
    }

    async fn reconcile_pix_event(
        &self,
        payload: &PixWebhookPayload,
    ) -> Result<Option<ReconcileOutcome>, PaymentError> {
        let target = match (payload.event.as_str(), payload.data.status.as_str()) {
            (PIX_PAID_EVENT, "PAID") => PaymentStatus::Paid,
            (PIX_EXPIRED_EVENT, "EXPIRED") => PaymentStatus::Expired,
            (event, status) => {
                tracing::debug!(event, status, "Ignoring PIX webhook event");
                return Ok(None);
            }
        };

        let Some(purchase) = self.store.find_by_charge_id(&payload.data.id).await? else {
            tracing::warn!(charge_id = %payload.data.id, "PIX webhook for unknown charge");
            return Ok(None);
        };

        self.apply_transition(&purchase, target).await.map(Some)
    }

    /// Checkout provider notification. Errors are logged and swallowed.
    pub async fn process_checkout_notification(
        &self,
        notification: &CheckoutNotification,
    ) -> Option<ReconcileOutcome> {
        match self.reconcile_checkout(notification).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    kind = %notification.kind,
                    id = %notification.id,
                    error = %e,
                    "Failed to process checkout notification"
                );
                None
            }
        }
    }

    async fn reconcile_checkout(
        &self,
        notification: &CheckoutNotification,
    ) -> Result<Option<ReconcileOutcome>, PaymentError> {
        if !matches!(notification.kind.as_str(), "payment" | "merchant_order") {
            tracing::debug!(kind = %notification.kind, "Ignoring checkout notification topic");
            return Ok(None);
        }

        let payment = match self.checkout.get_payment(&notification.id).await {
            Ok(payment) => payment,
            Err(ProviderError::NotFound) => return self.match_preference(&notification.id).await,
            Err(e) => return Err(e.into()),
        };

        let Some(purchase) = self.resolve_checkout_purchase(&payment).await? else {
            tracing::info!(
                payment_id = %payment.id,
                status = %payment.status,
                "Checkout payment matched no purchase"
            );
            return Ok(None);
        };

        if purchase.payment_status.is_terminal() {
            return Ok(Some(ReconcileOutcome {
                purchase_id: purchase.id,
                status: ReconcileStatus::AlreadyProcessed,
            }));
        }

        if let Some(method) = payment.detected_method() {
            if method != purchase.payment_method {
                tracing::info!(
                    purchase_id = purchase.id,
                    from = ?purchase.payment_method,
                    to = ?method,
                    "Correcting payment method"
                );
                self.store.set_payment_method(purchase.id, method).await?;
            }
        }

        match checkout_target(&payment.status) {
            Some(target) => self.apply_transition(&purchase, target).await.map(Some),
            None => Ok(Some(ReconcileOutcome {
                purchase_id: purchase.id,
                status: ReconcileStatus::Reported(payment.status.clone()),
            })),
        }
    }

    /// The notified id was not a payment; try it as a preference id
    async fn match_preference(
        &self,
        preference_id: &str,
    ) -> Result<Option<ReconcileOutcome>, PaymentError> {
        let preference = match self.checkout.get_preference(preference_id).await {
            Ok(preference) => preference,
            Err(ProviderError::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(self
            .store
            .find_by_payment_id(&preference.id)
            .await?
            .map(|purchase| ReconcileOutcome {
                purchase_id: purchase.id,
                status: ReconcileStatus::NotificationReceived,
            }))
    }

    /// Preference id first, then the first pending purchase of the gift named
    /// by the external reference. A preference id that matches no purchase
    /// still falls through to the external reference.
    pub async fn resolve_checkout_purchase(
        &self,
        payment: &ProviderPayment,
    ) -> Result<Option<Purchase>, PaymentError> {
        if let Some(preference_id) = payment.preference_id.as_deref().filter(|id| !id.is_empty()) {
            if let Some(purchase) = self.store.find_by_payment_id(preference_id).await? {
                return Ok(Some(purchase));
            }
        }

        let Some(gift_id) = payment
            .external_reference
            .as_deref()
            .and_then(parse_external_reference)
        else {
            return Ok(None);
        };

        Ok(self
            .store
            .purchases_for_gift(gift_id)
            .await?
            .into_iter()
            .find(|p| p.payment_status == PaymentStatus::Pending))
    }
}
