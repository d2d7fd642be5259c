//! Notification DTOs

use carwash_core::models::Channel;
use carwash_services::Recipient;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Pre-rendered message to fan out
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotificationRequest {
    #[validate(length(min = 1, message = "At least one channel is required"))]
    pub channels: Vec<Channel>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub subject: String,

    #[validate(length(min = 1, max = 4000, message = "Message is required"))]
    pub message: String,
}

impl NotificationRequest {
    pub fn recipient(&self) -> Recipient {
        Recipient {
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}
