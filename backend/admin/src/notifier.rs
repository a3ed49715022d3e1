//! Outbound buyer notifications through a WhatsApp-style messaging provider.
//!
//! ## Failure model
//!
//! * No provider URL configured: the message is not sent and the outcome is
//!   [`NotificationOutcome::Skipped`].
//! * Transport errors and non-2xx responses are logged at `warn` and reported
//!   as [`NotificationOutcome::Failed`]. They never fail the caller's request.

use raffle_rules::availability;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::Result;
use crate::models::{Purchase, Raffle, Ticket};

/// Request body expected by the provider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub recipient_phone_number: String,
    pub text_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_payload: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    Skipped,
    Failed,
}

#[derive(Clone)]
pub struct Notifier {
    client: Client,
    url: Option<String>,
    token: Option<String>,
}

impl Notifier {
    pub fn new(client: Client, url: Option<String>, token: Option<String>) -> Self {
        Notifier { client, url, token }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            client,
            config.whatsapp_api_url.clone(),
            config.whatsapp_api_token.clone(),
        )
    }

    /// Deliver one message. Errors are swallowed into the outcome.
    pub async fn send(&self, message: &OutboundMessage) -> NotificationOutcome {
        let Some(url) = self.url.as_deref() else {
            debug!("messaging provider not configured, notification skipped");
            return NotificationOutcome::Skipped;
        };

        match self.deliver(url, message).await {
            Ok(()) => {
                debug!(to = %message.recipient_phone_number, "notification sent");
                NotificationOutcome::Sent
            }
            Err(e) => {
                warn!(to = %message.recipient_phone_number, "notification failed: {e}");
                NotificationOutcome::Failed
            }
        }
    }

    async fn deliver(&self, url: &str, message: &OutboundMessage) -> Result<()> {
        let mut request = self.client.post(url).json(message);
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }

    /// Tell the buyer their payment was verified and which numbers they hold.
    pub async fn purchase_confirmed(
        &self,
        purchase: &Purchase,
        raffle: &Raffle,
        tickets: &[Ticket],
    ) -> NotificationOutcome {
        let message = OutboundMessage {
            recipient_phone_number: purchase.buyer_phone.clone(),
            text_body: confirmation_text(purchase, raffle, tickets),
            media_payload: None,
        };
        self.send(&message).await
    }
}

fn confirmation_text(purchase: &Purchase, raffle: &Raffle, tickets: &[Ticket]) -> String {
    let numbers: Vec<String> = tickets
        .iter()
        .map(|t| availability::display_number(t.number, raffle.min_tickets))
        .collect();
    format!(
        "Hola {}, tu compra en \"{}\" fue confirmada. Tus números: {}. Total: {} {}.",
        purchase.buyer_name,
        raffle.name,
        numbers.join(", "),
        purchase.amount,
        raffle.currency,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{http::HeaderMap, routing::post, Json, Router};
    use chrono::Utc;
    use raffle_rules::{Currency, PurchaseStatus, RaffleStatus, TicketStatus};
    use rust_decimal::Decimal;

    use super::*;

    fn fixtures() -> (Purchase, Raffle, Vec<Ticket>) {
        let now = Utc::now();
        let raffle = Raffle {
            id: 1,
            name: "Moto 0km".to_string(),
            slug: "moto-0km".to_string(),
            description: String::new(),
            price: Decimal::from(5),
            currency: Currency::Usd,
            min_tickets: 100,
            status: RaffleStatus::Active,
            winning_ticket_number: None,
            limit_date: None,
            created_at: now,
            updated_at: now,
        };
        let purchase = Purchase {
            id: 9,
            raffle_id: 1,
            buyer_name: "Ana".to_string(),
            buyer_email: "ana@example.com".to_string(),
            buyer_phone: "+584141234567".to_string(),
            buyer_id_number: None,
            payment_method_id: None,
            payment_reference: None,
            payment_proof_url: None,
            ticket_count: 2,
            amount: Decimal::from(10),
            status: PurchaseStatus::Confirmed,
            rejection_reason: None,
            rejection_comment: None,
            referral_code: None,
            referral_name: None,
            created_at: now,
            updated_at: now,
        };
        let tickets = [7, 42]
            .into_iter()
            .map(|number| Ticket {
                id: number,
                raffle_id: 1,
                number,
                status: TicketStatus::Sold,
                reserved_until: None,
                purchase_id: Some(9),
                reservation_token: None,
            })
            .collect();
        (purchase, raffle, tickets)
    }

    #[test]
    fn message_uses_provider_field_names() {
        let body = serde_json::to_value(OutboundMessage {
            recipient_phone_number: "+58414".to_string(),
            text_body: "hola".to_string(),
            media_payload: None,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "recipientPhoneNumber": "+58414", "textBody": "hola" })
        );
    }

    #[test]
    fn confirmation_text_pads_numbers() {
        let (purchase, raffle, tickets) = fixtures();
        let text = confirmation_text(&purchase, &raffle, &tickets);
        assert!(text.contains("007, 042"), "{text}");
        assert!(text.contains("10 USD"), "{text}");
    }

    #[tokio::test]
    async fn unconfigured_provider_is_skipped() {
        let (purchase, raffle, tickets) = fixtures();
        let notifier = Notifier::new(Client::new(), None, None);
        assert_eq!(
            notifier.purchase_confirmed(&purchase, &raffle, &tickets).await,
            NotificationOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn unreachable_provider_is_failed() {
        let (purchase, raffle, tickets) = fixtures();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = Notifier::new(Client::new(), Some(format!("http://{addr}/messages")), None);
        assert_eq!(
            notifier.purchase_confirmed(&purchase, &raffle, &tickets).await,
            NotificationOutcome::Failed
        );
    }

    #[tokio::test]
    async fn posts_json_with_bearer_token() {
        let seen: Arc<Mutex<Vec<(Option<String>, Value)>>> = Arc::default();
        let sink = seen.clone();
        let app = Router::new().route(
            "/messages",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    sink.lock().unwrap().push((auth, body));
                    "ok"
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let (purchase, raffle, tickets) = fixtures();
        let notifier = Notifier::new(
            Client::new(),
            Some(format!("http://{addr}/messages")),
            Some("secret".to_string()),
        );
        assert_eq!(
            notifier.purchase_confirmed(&purchase, &raffle, &tickets).await,
            NotificationOutcome::Sent
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("Bearer secret"));
        assert_eq!(seen[0].1["recipientPhoneNumber"], "+584141234567");
    }
}
