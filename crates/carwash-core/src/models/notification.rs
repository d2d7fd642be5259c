//! Outbound notification models
//!
//! Messages arrive fully rendered; channels only deliver them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Whatsapp,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Whatsapp => write!(f, "whatsapp"),
        }
    }
}

/// Rendered message for one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Email address or phone number, depending on the channel
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Provider acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
}
