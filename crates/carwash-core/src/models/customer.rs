//! Customer model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored customer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

impl Customer {
    /// Name used in greetings and on invoices
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Valued Customer")
    }

    pub fn contact(&self) -> CustomerContact {
        CustomerContact {
            name: self.display_name().to_string(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Contact details as printed on an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let mut customer = Customer {
            id: Uuid::new_v4(),
            name: None,
            email: "thandi@example.com".to_string(),
            phone: None,
        };
        assert_eq!(customer.display_name(), "Valued Customer");

        customer.name = Some("  ".to_string());
        assert_eq!(customer.display_name(), "Valued Customer");

        customer.name = Some("Thandi".to_string());
        assert_eq!(customer.contact().name, "Thandi");
    }
}
