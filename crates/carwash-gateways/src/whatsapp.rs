//! WhatsApp Cloud API channel

use async_trait::async_trait;
use carwash_core::{
    models::{Channel, DeliveryReceipt, OutboundMessage},
    traits::NotificationChannel,
    AppError, AppResult,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::{http_client, transport_error};

/// Sends text messages from a WhatsApp Business phone number
pub struct WhatsAppChannel {
    client: Client,
    api_base: String,
    phone_number_id: String,
    token: String,
}

impl WhatsAppChannel {
    pub fn new(api_base: &str, phone_number_id: &str, token: &str) -> AppResult<Self> {
        Ok(Self {
            client: http_client()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.to_string(),
            token: token.to_string(),
        })
    }

    /// Destination as the API expects it: digits only
    fn destination(to: &str) -> AppResult<String> {
        let digits: String = to.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "not a phone number: {}",
                to
            )));
        }
        Ok(digits)
    }

    fn payload(message: &OutboundMessage) -> AppResult<Value> {
        let text = if message.subject.trim().is_empty() {
            message.body.clone()
        } else {
            format!("*{}*\n\n{}", message.subject, message.body)
        };

        Ok(json!({
            "messaging_product": "whatsapp",
            "to": Self::destination(&message.to)?,
            "type": "text",
            "text": { "body": text },
        }))
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    fn channel(&self) -> Channel {
        Channel::Whatsapp
    }

    #[instrument(skip(self, message))]
    async fn send(&self, message: &OutboundMessage) -> AppResult<DeliveryReceipt> {
        let payload = Self::payload(message)?;

        let response = self
            .client
            .post(format!("{}/{}/messages", self.api_base, self.phone_number_id))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("whatsapp", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("WhatsApp API error: status={} {}", status, body);
            return Err(AppError::Upstream(format!(
                "whatsapp returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let sent: SendResponse = response.json().await.unwrap_or_default();
        let message_id = sent.messages.into_iter().next().map(|m| m.id);
        info!("WhatsApp message sent: {:?}", message_id);

        Ok(DeliveryReceipt { message_id })
    }
}

#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}
