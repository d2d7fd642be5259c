//! Notification fan-out
//!
//! Messages are rendered by the caller; this service only routes them to the
//! configured channels and reports per-channel delivery.

use carwash_core::{
    models::{Channel, OutboundMessage},
    traits::NotificationChannel,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Where a message may be delivered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Recipient {
    pub fn email(address: impl Into<String>) -> Self {
        Self {
            email: Some(address.into()),
            phone: None,
        }
    }

    fn destination(&self, channel: Channel) -> Option<&str> {
        let value = match channel {
            Channel::Email => self.email.as_deref(),
            Channel::Whatsapp => self.phone.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Delivery result for one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReport {
    pub channel: Channel,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelReport {
    fn failed(channel: Channel, error: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Delivery results for a dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReport {
    pub results: Vec<ChannelReport>,
}

impl NotificationReport {
    /// True when at least one channel delivered
    pub fn any_delivered(&self) -> bool {
        self.results.iter().any(|r| r.success)
    }

    pub fn get(&self, channel: Channel) -> Option<&ChannelReport> {
        self.results.iter().find(|r| r.channel == channel)
    }
}

/// Routes rendered messages to the configured channels
#[derive(Default)]
pub struct NotificationService {
    channels: HashMap<Channel, Arc<dyn NotificationChannel>>,
}

impl NotificationService {
    /// Create a service with the given channels
    ///
    /// Channels left out are reported as not configured.
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self {
            channels: channels.into_iter().map(|c| (c.channel(), c)).collect(),
        }
    }

    pub fn is_configured(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Send one message over each requested channel
    ///
    /// Channels are contacted concurrently; results keep the requested order.
    /// Failures are reported per channel and never abort the dispatch.
    #[instrument(skip(self, body))]
    pub async fn dispatch(
        &self,
        channels: &[Channel],
        recipient: &Recipient,
        subject: &str,
        body: &str,
    ) -> NotificationReport {
        let results = join_all(
            channels
                .iter()
                .map(|&channel| self.deliver(channel, recipient, subject, body)),
        )
        .await;

        NotificationReport { results }
    }

    /// Send a message by e-mail only
    pub async fn email(&self, to: &str, subject: &str, body: &str) -> ChannelReport {
        self.deliver(Channel::Email, &Recipient::email(to), subject, body)
            .await
    }

    async fn deliver(
        &self,
        channel: Channel,
        recipient: &Recipient,
        subject: &str,
        body: &str,
    ) -> ChannelReport {
        let Some(sender) = self.channels.get(&channel) else {
            warn!("{} channel not configured, message '{}' not sent", channel, subject);
            return ChannelReport::failed(channel, format!("{} channel not configured", channel));
        };

        let Some(to) = recipient.destination(channel) else {
            return ChannelReport::failed(channel, format!("no {} destination", channel));
        };

        let message = OutboundMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        match sender.send(&message).await {
            Ok(receipt) => {
                info!("{} notification '{}' delivered", channel, subject);
                ChannelReport {
                    channel,
                    success: true,
                    message_id: receipt.message_id,
                    error: None,
                }
            }
            Err(e) => {
                warn!("{} notification '{}' failed: {}", channel, subject, e);
                ChannelReport::failed(channel, e.to_string())
            }
        }
    }
}
