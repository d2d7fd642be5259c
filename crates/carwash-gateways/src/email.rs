//! E-mail through an HTTP mail relay
//!
//! The relay receives `{from, to, subject, text}` as JSON and may answer with
//! an `id` for the queued message.

use async_trait::async_trait;
use carwash_core::{
    models::{Channel, DeliveryReceipt, OutboundMessage},
    traits::NotificationChannel,
    AppError, AppResult,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::{http_client, transport_error};

/// Plain-text e-mail channel
pub struct HttpEmailChannel {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpEmailChannel {
    pub fn new(endpoint: &str, api_key: Option<String>, from: &str) -> AppResult<Self> {
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.to_string(),
            api_key,
            from: from.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct RelayResponse {
    id: Option<String>,
}

#[async_trait]
impl NotificationChannel for HttpEmailChannel {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: &OutboundMessage) -> AppResult<DeliveryReceipt> {
        if !message.to.contains('@') {
            return Err(AppError::InvalidInput(format!(
                "not an e-mail address: {}",
                message.to
            )));
        }

        let mut request = self.client.post(&self.endpoint).json(&RelayRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error("mail relay", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Mail relay error: status={} {}", status, body);
            return Err(AppError::Upstream(format!(
                "mail relay returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let queued: RelayResponse = response.json().await.unwrap_or_default();
        info!("E-mail queued: {:?}", queued.id);

        Ok(DeliveryReceipt {
            message_id: queued.id,
        })
    }
}
