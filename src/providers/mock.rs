//! Static in-memory providers, used when no credentials are configured
//! and throughout the test suites.

use async_trait::async_trait;
use serde_json::json;

use super::{
    FlightCriteria, FlightProvider, HotelCriteria, HotelProvider, PlaceCriteria, PlaceKind,
    PlaceProvider, ProviderError,
};
use crate::domain::ResultRecord;

#[derive(Debug, Default)]
pub struct StaticFlightProvider {
    fixed: Option<Vec<ResultRecord>>,
}

impl StaticFlightProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return exactly these records, regardless of criteria.
    pub fn fixed(records: Vec<ResultRecord>) -> Self {
        Self {
            fixed: Some(records),
        }
    }

    /// Always return no results.
    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }
}

#[async_trait]
impl FlightProvider for StaticFlightProvider {
    async fn search_flights(
        &self,
        criteria: &FlightCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError> {
        if let Some(fixed) = &self.fixed {
            return Ok(fixed.clone());
        }
        Ok(sample_flights(criteria))
    }
}

fn sample_flights(criteria: &FlightCriteria) -> Vec<ResultRecord> {
    let route = format!("{} -> {}", criteria.origin, criteria.destination);
    vec![
        ResultRecord {
            id: "FL001".into(),
            name: format!("Iberia nonstop, {route}"),
            price: Some(645.0),
            rating: None,
            address: None,
            schedule: Some(format!("{} 09:30 dep / 22:45 arr", criteria.departure_date)),
            details: json!({ "airline": "IB", "stops": 0, "cabin": "ECONOMY" }),
        },
        ResultRecord {
            id: "FL002".into(),
            name: format!("Lufthansa one-stop via FRA, {route}"),
            price: Some(512.0),
            rating: None,
            address: None,
            schedule: Some(format!("{} 07:10 dep / 23:55 arr", criteria.departure_date)),
            details: json!({ "airline": "LH", "stops": 1, "cabin": "ECONOMY" }),
        },
        ResultRecord {
            id: "FL003".into(),
            name: format!("Air France one-stop via CDG, {route}"),
            price: Some(538.0),
            rating: None,
            address: None,
            schedule: Some(format!("{} 11:05 dep / 02:20+1 arr", criteria.departure_date)),
            details: json!({ "airline": "AF", "stops": 1, "cabin": "ECONOMY" }),
        },
    ]
}

#[derive(Debug, Default)]
pub struct StaticHotelProvider {
    fixed: Option<Vec<ResultRecord>>,
}

impl StaticHotelProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed(records: Vec<ResultRecord>) -> Self {
        Self {
            fixed: Some(records),
        }
    }

    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }
}

#[async_trait]
impl HotelProvider for StaticHotelProvider {
    async fn search_hotels(
        &self,
        criteria: &HotelCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError> {
        if let Some(fixed) = &self.fixed {
            return Ok(fixed.clone());
        }
        Ok(sample_hotels(criteria))
    }
}

fn sample_hotels(criteria: &HotelCriteria) -> Vec<ResultRecord> {
    vec![
        ResultRecord {
            id: "HT001".into(),
            name: "Gran Via Palace".into(),
            price: Some(189.0),
            rating: Some(4.6),
            address: Some(format!("12 Gran Via, {}", criteria.city_code)),
            schedule: None,
            details: json!({ "amenities": ["wifi", "breakfast", "gym"], "room": "DOUBLE" }),
        },
        ResultRecord {
            id: "HT002".into(),
            name: "Plaza Central Suites".into(),
            price: Some(142.0),
            rating: Some(4.2),
            address: Some(format!("3 Plaza Mayor, {}", criteria.city_code)),
            schedule: None,
            details: json!({ "amenities": ["wifi", "pool"], "room": "SUITE" }),
        },
        ResultRecord {
            id: "HT003".into(),
            name: "Riverside Boutique".into(),
            price: Some(231.0),
            rating: Some(4.8),
            address: Some(format!("45 Paseo del Rio, {}", criteria.city_code)),
            schedule: None,
            details: json!({ "amenities": ["wifi", "spa", "bar"], "room": "DOUBLE" }),
        },
    ]
}

#[derive(Debug, Default)]
pub struct StaticPlaceProvider {
    fixed: Option<Vec<ResultRecord>>,
}

impl StaticPlaceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed(records: Vec<ResultRecord>) -> Self {
        Self {
            fixed: Some(records),
        }
    }

    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }
}

#[async_trait]
impl PlaceProvider for StaticPlaceProvider {
    async fn search_places(
        &self,
        kind: PlaceKind,
        criteria: &PlaceCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError> {
        if let Some(fixed) = &self.fixed {
            return Ok(fixed.clone());
        }
        let records = match kind {
            PlaceKind::Restaurant => sample_restaurants(criteria),
            PlaceKind::Attraction => sample_attractions(criteria),
        };
        Ok(records
            .into_iter()
            .filter(|r| match (criteria.min_rating, r.rating) {
                (Some(min), Some(rating)) => rating >= min,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .take(criteria.max_results)
            .collect())
    }
}

fn sample_restaurants(criteria: &PlaceCriteria) -> Vec<ResultRecord> {
    vec![
        ResultRecord {
            id: "RS001".into(),
            name: "Casa Lucio".into(),
            price: Some(55.0),
            rating: Some(4.5),
            address: Some(format!("Cava Baja 35, {}", criteria.city)),
            schedule: Some("13:00-16:00, 20:00-24:00".into()),
            details: json!({ "cuisine": "traditional", "price_level": 3 }),
        },
        ResultRecord {
            id: "RS002".into(),
            name: "Verde Oliva".into(),
            price: Some(28.0),
            rating: Some(4.7),
            address: Some(format!("Calle Mayor 8, {}", criteria.city)),
            schedule: Some("12:00-23:00".into()),
            details: json!({ "cuisine": "vegetarian", "price_level": 2 }),
        },
        ResultRecord {
            id: "RS003".into(),
            name: "Marisqueria El Puerto".into(),
            price: Some(64.0),
            rating: Some(4.3),
            address: Some(format!("Plaza del Mar 2, {}", criteria.city)),
            schedule: Some("13:00-23:30".into()),
            details: json!({ "cuisine": "seafood", "price_level": 3 }),
        },
        ResultRecord {
            id: "RS004".into(),
            name: "Taberna Rapida".into(),
            price: Some(15.0),
            rating: Some(3.9),
            address: Some(format!("Calle Estrecha 19, {}", criteria.city)),
            schedule: Some("11:00-22:00".into()),
            details: json!({ "cuisine": "tapas", "price_level": 1 }),
        },
    ]
}

fn sample_attractions(criteria: &PlaceCriteria) -> Vec<ResultRecord> {
    vec![
        ResultRecord {
            id: "AT001".into(),
            name: "Royal Palace".into(),
            price: Some(14.0),
            rating: Some(4.7),
            address: Some(format!("Calle de Bailen, {}", criteria.city)),
            schedule: Some("10:00-18:00".into()),
            details: json!({ "category": "historic", "duration_hours": 2 }),
        },
        ResultRecord {
            id: "AT002".into(),
            name: "National Art Museum".into(),
            price: Some(16.0),
            rating: Some(4.8),
            address: Some(format!("Paseo del Arte 1, {}", criteria.city)),
            schedule: Some("10:00-20:00".into()),
            details: json!({ "category": "museum", "duration_hours": 3 }),
        },
        ResultRecord {
            id: "AT003".into(),
            name: "Old Town Walking Route".into(),
            price: None,
            rating: Some(4.4),
            address: Some(criteria.city.clone()),
            schedule: None,
            details: json!({ "category": "outdoors", "duration_hours": 2 }),
        },
        ResultRecord {
            id: "AT004".into(),
            name: "Botanical Gardens".into(),
            price: Some(6.0),
            rating: Some(4.5),
            address: Some(format!("Plaza de Murillo 2, {}", criteria.city)),
            schedule: Some("10:00-19:00".into()),
            details: json!({ "category": "outdoors", "duration_hours": 1 }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn min_rating_filters_samples() {
        let provider = StaticPlaceProvider::new();
        let criteria = PlaceCriteria {
            city: "Madrid".into(),
            min_rating: Some(4.0),
            ..Default::default()
        };
        let records = provider
            .search_places(PlaceKind::Restaurant, &criteria)
            .await
            .unwrap();
        assert!(records.iter().all(|r| r.rating.unwrap() >= 4.0));
        assert!(!records.iter().any(|r| r.id == "RS004"));
    }

    #[tokio::test]
    async fn fixed_ignores_criteria() {
        let provider = StaticFlightProvider::fixed(vec![ResultRecord::new("X1", "only")]);
        let criteria = FlightCriteria {
            origin: "AAA".into(),
            destination: "BBB".into(),
            departure_date: "2026-01-01".into(),
            return_date: None,
            adults: 1,
            max_results: 10,
        };
        let records = provider.search_flights(&criteria).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "X1");
    }
}
