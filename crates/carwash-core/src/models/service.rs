//! Service catalog models
//!
//! Each wash service is priced per vehicle category.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Vehicle category used for pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Small,
    Suv,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleType::Small => write!(f, "small"),
            VehicleType::Suv => write!(f, "suv"),
        }
    }
}

impl VehicleType {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "small" => Some(VehicleType::Small),
            "suv" => Some(VehicleType::Suv),
            _ => None,
        }
    }

    /// Label used on invoices
    pub fn label(&self) -> &'static str {
        match self {
            VehicleType::Small => "SMALL",
            VehicleType::Suv => "SUV",
        }
    }
}

/// Service tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTier {
    #[default]
    Basic,
    Standard,
    Premium,
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceTier::Basic => write!(f, "basic"),
            ServiceTier::Standard => write!(f, "standard"),
            ServiceTier::Premium => write!(f, "premium"),
        }
    }
}

impl ServiceTier {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Some(ServiceTier::Basic),
            "standard" => Some(ServiceTier::Standard),
            "premium" => Some(ServiceTier::Premium),
            _ => None,
        }
    }
}

/// Catalog entry for a wash service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WashService {
    pub id: Uuid,

    /// Stable public identifier (e.g. "standard-full")
    pub slug: String,

    pub name: String,

    pub description: String,

    pub tier: ServiceTier,

    pub category: String,

    /// Time blocked in the schedule per appointment
    pub duration_minutes: u32,

    /// Price for small vehicles
    pub small_price: Decimal,

    /// Price for SUVs
    pub suv_price: Decimal,
}

impl WashService {
    /// Price charged for one vehicle of the given category
    #[inline]
    pub fn price_for(&self, vehicle: VehicleType) -> Decimal {
        match vehicle {
            VehicleType::Small => self.small_price,
            VehicleType::Suv => self.suv_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_for_vehicle() {
        let service = WashService {
            id: Uuid::new_v4(),
            slug: "exterior-basic".to_string(),
            name: "Exterior Wash".to_string(),
            description: String::new(),
            tier: ServiceTier::Basic,
            category: "exterior".to_string(),
            duration_minutes: 30,
            small_price: dec!(120),
            suv_price: dec!(150),
        };

        assert_eq!(service.price_for(VehicleType::Small), dec!(120));
        assert_eq!(service.price_for(VehicleType::Suv), dec!(150));
    }

    #[test]
    fn test_vehicle_type_parse() {
        assert_eq!(VehicleType::from_str("SUV"), Some(VehicleType::Suv));
        assert_eq!(VehicleType::from_str("small"), Some(VehicleType::Small));
        assert_eq!(VehicleType::from_str("truck"), None);
        assert_eq!(VehicleType::Suv.label(), "SUV");
    }
}
