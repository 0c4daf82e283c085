pub mod amadeus;
pub mod mock;
pub mod places;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ResultRecord;

/// Failures from the travel-search backends. All of these are recoverable
/// from the agent loop's point of view; they are fed back to the model as
/// tool errors with a corrective hint where one exists.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider authentication failed: {0}")]
    Auth(String),

    #[error("provider API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider network error: {0}")]
    Network(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ProviderError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl ProviderError {
    /// Hint text fed back to the model so it can correct its own call.
    /// Invalid-location 400s get the IATA guidance from the flight and
    /// hotel backends, which reject city names like "Madrid" where they
    /// expect the code "MAD".
    pub fn hint(&self) -> Option<String> {
        match self {
            ProviderError::Api { status, message } if *status == 400 => {
                if message.contains("INVALID") || message.to_lowercase().contains("location") {
                    Some(
                        "Location fields must be 3-letter IATA codes, not city names: \
                         use 'MAD' for Madrid, 'NYC' for New York, 'LON' for London. \
                         Retry the search with corrected codes."
                            .to_string(),
                    )
                } else {
                    Some("The request was rejected; check date formats (YYYY-MM-DD) and retry.".to_string())
                }
            }
            _ => None,
        }
    }
}

fn default_flight_adults() -> u32 {
    1
}

fn default_flight_max() -> usize {
    10
}

/// Parameters for a flight-offers search, also exposed verbatim as the
/// SearchFlights tool schema.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FlightCriteria {
    /// Origin airport or city, 3-letter IATA code
    pub origin: String,
    /// Destination airport or city, 3-letter IATA code
    pub destination: String,
    /// Departure date, YYYY-MM-DD
    pub departure_date: String,
    /// Return date for round trips, YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default = "default_flight_adults")]
    pub adults: u32,
    #[serde(default = "default_flight_max")]
    pub max_results: usize,
}

fn default_hotel_adults() -> u32 {
    2
}

fn default_hotel_max() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct HotelCriteria {
    /// City, 3-letter IATA city code
    pub city_code: String,
    /// Check-in date, YYYY-MM-DD
    pub check_in_date: String,
    /// Check-out date, YYYY-MM-DD
    pub check_out_date: String,
    #[serde(default = "default_hotel_adults")]
    pub adults: u32,
    #[serde(default = "default_hotel_max")]
    pub max_results: usize,
}

fn default_place_max() -> usize {
    15
}

/// Parameters for restaurant and attraction searches. Most fields are
/// soft constraints folded into the text query; `min_rating` is enforced
/// client-side.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PlaceCriteria {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f32>,
    /// Price level 0 (free) to 4 (very expensive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cuisine_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dietary_restrictions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub atmosphere: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    /// Landmark to bias results toward, typically the chosen hotel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity_location: Option<String>,
    #[serde(default = "default_place_max")]
    pub max_results: usize,
}

impl Default for PlaceCriteria {
    fn default() -> Self {
        Self {
            city: String::new(),
            min_rating: None,
            price_level: None,
            cuisine_types: Vec::new(),
            dietary_restrictions: Vec::new(),
            atmosphere: Vec::new(),
            open_now: None,
            proximity_location: None,
            max_results: default_place_max(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceKind {
    Restaurant,
    Attraction,
}

impl PlaceKind {
    pub fn query_noun(&self) -> &'static str {
        match self {
            PlaceKind::Restaurant => "restaurants",
            PlaceKind::Attraction => "tourist attractions",
        }
    }

    pub fn api_type(&self) -> &'static str {
        match self {
            PlaceKind::Restaurant => "restaurant",
            PlaceKind::Attraction => "tourist_attraction",
        }
    }
}

#[async_trait]
pub trait FlightProvider: Send + Sync {
    async fn search_flights(
        &self,
        criteria: &FlightCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError>;
}

#[async_trait]
pub trait HotelProvider: Send + Sync {
    async fn search_hotels(
        &self,
        criteria: &HotelCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError>;
}

#[async_trait]
pub trait PlaceProvider: Send + Sync {
    async fn search_places(
        &self,
        kind: PlaceKind,
        criteria: &PlaceCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_location_hint_mentions_iata() {
        let err = ProviderError::Api {
            status: 400,
            message: "INVALID FORMAT: originLocationCode".into(),
        };
        let hint = err.hint().unwrap();
        assert!(hint.contains("MAD"));
    }

    #[test]
    fn network_errors_have_no_hint() {
        assert!(ProviderError::Network("refused".into()).hint().is_none());
    }

    #[test]
    fn flight_criteria_defaults() {
        let c: FlightCriteria = serde_json::from_str(
            r#"{"origin":"JFK","destination":"MAD","departure_date":"2026-09-10"}"#,
        )
        .unwrap();
        assert_eq!(c.adults, 1);
        assert_eq!(c.max_results, 10);
    }
}
