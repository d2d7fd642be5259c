//! Travel surcharge for addresses outside the free service radius

use carwash_core::{
    config::ServiceAreaConfig,
    models::{Coordinates, DistanceQuote},
    traits::Geocoder,
    AppError, AppResult,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::constants::EARTH_RADIUS_KM;

/// Great-circle distance in kilometres
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Surcharge for a trip of `distance_km`
///
/// Zero inside the radius, otherwise the excess kilometres times the rate,
/// rounded up to a whole currency unit.
pub fn surcharge_for(distance_km: f64, radius_km: f64, per_km_rate: Decimal) -> AppResult<Decimal> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "distance {} km is not a valid distance",
            distance_km
        )));
    }
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "free radius {} km must not be negative",
            radius_km
        )));
    }
    if per_km_rate.is_sign_negative() {
        return Err(AppError::InvalidInput(format!(
            "per-km rate {} must not be negative",
            per_km_rate
        )));
    }

    if distance_km <= radius_km {
        return Ok(Decimal::ZERO);
    }

    let excess = Decimal::from_f64(distance_km - radius_km).ok_or_else(|| {
        AppError::InvalidInput(format!("distance {} km is out of range", distance_km))
    })?;

    excess
        .checked_mul(per_km_rate)
        .map(|charge| charge.ceil())
        .ok_or_else(|| {
            AppError::InvalidInput(format!("distance {} km is out of range", distance_km))
        })
}

/// Distance quote between the base and a destination
pub fn quote(
    origin: Coordinates,
    destination: Coordinates,
    radius_km: f64,
    per_km_rate: Decimal,
) -> AppResult<DistanceQuote> {
    origin.validate()?;
    destination.validate()?;

    let distance_km = haversine_km(origin, destination);
    let surcharge = surcharge_for(distance_km, radius_km, per_km_rate)?;

    Ok(DistanceQuote {
        origin_address: String::new(),
        distance_km,
        within_free_radius: distance_km <= radius_km,
        surcharge,
    })
}

/// Address quotes against the configured base location
pub struct LocationService {
    geocoder: Arc<dyn Geocoder>,
    area: ServiceAreaConfig,
}

impl LocationService {
    /// Create a new location service
    pub fn new(geocoder: Arc<dyn Geocoder>, area: ServiceAreaConfig) -> Self {
        Self { geocoder, area }
    }

    pub fn base(&self) -> Coordinates {
        Coordinates::new(self.area.base_latitude, self.area.base_longitude)
    }

    pub fn free_radius_km(&self) -> f64 {
        self.area.free_radius_km
    }

    /// Surcharge for a trip of `distance_km` under the configured rates
    pub fn surcharge(&self, distance_km: f64) -> AppResult<Decimal> {
        surcharge_for(
            distance_km,
            self.area.free_radius_km,
            self.area.surcharge_per_km,
        )
    }

    /// Geocode `address` and quote the surcharge
    #[instrument(skip(self))]
    pub async fn quote_address(&self, address: &str) -> AppResult<DistanceQuote> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::InvalidInput("address must not be blank".to_string()));
        }

        let destination = self.geocoder.geocode(address).await.map_err(|e| {
            warn!("Geocoding failed for '{}': {}", address, e);
            e
        })?;

        let result = quote(
            self.base(),
            destination,
            self.area.free_radius_km,
            self.area.surcharge_per_km,
        )?
        .with_address(address);

        info!(
            "Quoted {:.1} km for '{}' (surcharge {})",
            result.distance_km, address, result.surcharge
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct FixedGeocoder(AppResult<Coordinates>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> AppResult<Coordinates> {
            match &self.0 {
                Ok(c) => Ok(*c),
                Err(_) => Err(AppError::UpstreamUnavailable(
                    "geocoding provider not configured".to_string(),
                )),
            }
        }
    }

    fn danoon() -> Coordinates {
        Coordinates::new(-26.5375, 31.0989)
    }

    #[test]
    fn test_same_point_is_free() {
        let q = quote(danoon(), danoon(), 20.0, dec!(20)).unwrap();
        assert_eq!(q.distance_km, 0.0);
        assert!(q.within_free_radius);
        assert_eq!(q.surcharge, Decimal::ZERO);
    }

    #[test]
    fn test_surcharge_beyond_radius() {
        assert_eq!(surcharge_for(25.0, 20.0, dec!(20)).unwrap(), dec!(100));
        assert_eq!(surcharge_for(20.0, 20.0, dec!(20)).unwrap(), Decimal::ZERO);
        assert_eq!(surcharge_for(20.01, 20.0, dec!(20)).unwrap(), dec!(1));
        assert_eq!(surcharge_for(3.0, 20.0, dec!(20)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_surcharge_rejects_bad_arguments() {
        assert!(surcharge_for(-1.0, 20.0, dec!(20)).is_err());
        assert!(surcharge_for(f64::NAN, 20.0, dec!(20)).is_err());
        assert!(surcharge_for(25.0, -5.0, dec!(20)).is_err());
        assert!(surcharge_for(25.0, 20.0, dec!(-1)).is_err());
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude is about 111.19 km on a 6371 km sphere.
        let d = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.01, "got {}", d);

        let there = haversine_km(danoon(), Coordinates::new(-26.3054, 31.1367));
        let back = haversine_km(Coordinates::new(-26.3054, 31.1367), danoon());
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_surcharge_overflow_is_rejected() {
        let err = surcharge_for(5e27, 20.0, dec!(20)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_antipodal_points() {
        let from = Coordinates::new(-6.377647337239125, -163.4650398437419);
        let to = Coordinates::new(6.377647337239125, 16.5349601562581);

        let d = haversine_km(from, to);
        assert!(d.is_finite());
        // Half the circumference of a 6371 km sphere.
        assert!((d - 20015.09).abs() < 0.1, "got {}", d);

        let q = quote(from, to, 20.0, dec!(20)).unwrap();
        assert!(!q.within_free_radius);
        assert!(q.surcharge > Decimal::ZERO);
    }

    #[test]
    fn test_quote_rejects_invalid_coordinates() {
        let err = quote(danoon(), Coordinates::new(-95.0, 31.0), 20.0, dec!(20)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_quote_address() {
        // About 0.5 degrees north of the base: well outside 20 km.
        let service = LocationService::new(
            Arc::new(FixedGeocoder(Ok(Coordinates::new(-26.0375, 31.0989)))),
            ServiceAreaConfig::default(),
        );

        let q = service.quote_address("  Mbabane  ").await.unwrap();
        assert_eq!(q.origin_address, "Mbabane");
        assert!(!q.within_free_radius);
        assert!(q.distance_km > 55.0 && q.distance_km < 56.0);
        assert_eq!(
            q.surcharge,
            (Decimal::from_f64(q.distance_km - 20.0).unwrap() * dec!(20)).ceil()
        );
    }

    #[tokio::test]
    async fn test_quote_address_errors() {
        let service = LocationService::new(
            Arc::new(FixedGeocoder(Err(AppError::Internal(String::new())))),
            ServiceAreaConfig::default(),
        );

        assert!(matches!(
            service.quote_address("   ").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            service.quote_address("Manzini").await,
            Err(AppError::UpstreamUnavailable(_))
        ));
    }
}
