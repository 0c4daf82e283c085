//! Amadeus self-service API client for flight and hotel search.
//!
//! Authenticates with the OAuth2 client-credentials grant and caches the
//! token until shortly before expiry. Transient network failures are
//! retried with exponential backoff; API rejections surface unretried so
//! the model can correct its own request.

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    FlightCriteria, FlightProvider, HotelCriteria, HotelProvider, ProviderError,
};
use crate::domain::ResultRecord;

pub struct AmadeusClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl AmadeusClient {
    pub fn new(base_url: String, api_key: String, api_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            api_secret,
            token: RwLock::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Utc::now() {
                    return Ok(token.value.clone());
                }
            }
        }

        let url = format!("{}/v1/security/oauth2/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.api_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "token request failed (status {status}): {message}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        // Refresh a minute early so in-flight requests never race expiry
        let cached = CachedToken {
            value: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(token.expires_in - 60),
        };
        *self.token.write().await = Some(cached);
        Ok(token.access_token)
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ProviderError> {
        backoff::future::retry(ExponentialBackoff::default(), || async {
            let token = self
                .access_token()
                .await
                .map_err(backoff::Error::permanent)?;
            let response = self
                .client
                .get(url)
                .bearer_auth(&token)
                .query(query)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(ProviderError::from(e)))?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                let err = ProviderError::Api {
                    status: status.as_u16(),
                    message,
                };
                // Server-side hiccups retry; client errors go back to the model
                return if status.is_server_error() {
                    Err(backoff::Error::transient(err))
                } else {
                    Err(backoff::Error::permanent(err))
                };
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(ProviderError::Malformed(e.to_string())))
        })
        .await
    }
}

/// Amadeus rejects city names where it expects IATA codes. Catching that
/// locally produces the same 400 shape the live API returns, so the
/// correction hint reaches the model without a wasted round trip.
fn validate_iata(field: &str, value: &str) -> Result<(), ProviderError> {
    let ok = value.len() == 3 && value.chars().all(|c| c.is_ascii_uppercase());
    if ok {
        Ok(())
    } else {
        Err(ProviderError::Api {
            status: 400,
            message: format!("INVALID FORMAT: {field} '{value}' is not an IATA location code"),
        })
    }
}

#[async_trait]
impl FlightProvider for AmadeusClient {
    async fn search_flights(
        &self,
        criteria: &FlightCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError> {
        validate_iata("originLocationCode", &criteria.origin)?;
        validate_iata("destinationLocationCode", &criteria.destination)?;

        let url = format!("{}/v2/shopping/flight-offers", self.base_url);
        let mut query = vec![
            ("originLocationCode", criteria.origin.clone()),
            ("destinationLocationCode", criteria.destination.clone()),
            ("departureDate", criteria.departure_date.clone()),
            ("adults", criteria.adults.to_string()),
            ("max", criteria.max_results.to_string()),
            ("currencyCode", "USD".to_string()),
        ];
        if let Some(ret) = &criteria.return_date {
            query.push(("returnDate", ret.clone()));
        }

        let body = self.get_json(&url, &query).await?;
        let offers = body["data"].as_array().cloned().unwrap_or_default();
        debug!(count = offers.len(), "amadeus flight offers received");

        Ok(offers.iter().filter_map(flight_record).collect())
    }
}

fn flight_record(offer: &Value) -> Option<ResultRecord> {
    let id = offer["id"].as_str()?.to_string();
    let price = offer["price"]["grandTotal"]
        .as_str()
        .and_then(|p| p.parse::<f64>().ok());

    let outbound = &offer["itineraries"][0];
    let segments = outbound["segments"].as_array()?;
    let first = segments.first()?;
    let last = segments.last()?;
    let carrier = first["carrierCode"].as_str().unwrap_or("??");
    let stops = segments.len().saturating_sub(1);

    let name = match stops {
        0 => format!("{carrier} nonstop"),
        1 => format!("{carrier} 1 stop"),
        n => format!("{carrier} {n} stops"),
    };
    let schedule = match (
        first["departure"]["at"].as_str(),
        last["arrival"]["at"].as_str(),
    ) {
        (Some(dep), Some(arr)) => Some(format!("{dep} dep / {arr} arr")),
        _ => None,
    };

    Some(ResultRecord {
        id,
        name,
        price,
        rating: None,
        address: None,
        schedule,
        details: json!({
            "airline": carrier,
            "stops": stops,
            "segments": segments.len(),
        }),
    })
}

#[async_trait]
impl HotelProvider for AmadeusClient {
    async fn search_hotels(
        &self,
        criteria: &HotelCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError> {
        validate_iata("cityCode", &criteria.city_code)?;

        // Two-step search: hotel ids by city, then live offers for those ids
        let list_url = format!(
            "{}/v1/reference-data/locations/hotels/by-city",
            self.base_url
        );
        let body = self
            .get_json(&list_url, &[("cityCode", criteria.city_code.clone())])
            .await?;
        let hotel_ids: Vec<String> = body["data"]
            .as_array()
            .map(|hotels| {
                hotels
                    .iter()
                    .filter_map(|h| h["hotelId"].as_str().map(str::to_string))
                    .take(criteria.max_results)
                    .collect()
            })
            .unwrap_or_default();

        if hotel_ids.is_empty() {
            return Ok(Vec::new());
        }

        let offers_url = format!("{}/v3/shopping/hotel-offers", self.base_url);
        let query = vec![
            ("hotelIds", hotel_ids.join(",")),
            ("checkInDate", criteria.check_in_date.clone()),
            ("checkOutDate", criteria.check_out_date.clone()),
            ("adults", criteria.adults.to_string()),
            ("currency", "USD".to_string()),
        ];
        let body = self.get_json(&offers_url, &query).await?;
        let entries = body["data"].as_array().cloned().unwrap_or_default();
        debug!(count = entries.len(), "amadeus hotel offers received");

        Ok(entries.iter().filter_map(hotel_record).collect())
    }
}

fn hotel_record(entry: &Value) -> Option<ResultRecord> {
    let hotel = &entry["hotel"];
    let id = hotel["hotelId"].as_str()?.to_string();
    let name = hotel["name"].as_str().unwrap_or(&id).to_string();
    let offer = &entry["offers"][0];
    let price = offer["price"]["total"]
        .as_str()
        .and_then(|p| p.parse::<f64>().ok());
    let rating = hotel["rating"]
        .as_str()
        .and_then(|r| r.parse::<f32>().ok());

    Some(ResultRecord {
        id,
        name,
        price,
        rating,
        address: hotel["address"]["lines"][0].as_str().map(str::to_string),
        schedule: None,
        details: json!({
            "room": offer["room"]["typeEstimated"]["category"],
            "board": offer["boardType"],
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_city_names_before_calling_out() {
        let err = validate_iata("originLocationCode", "Madrid").unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("Madrid"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(validate_iata("originLocationCode", "MAD").is_ok());
    }

    #[test]
    fn parses_flight_offer_shape() {
        let offer = json!({
            "id": "1",
            "price": { "grandTotal": "512.30" },
            "itineraries": [{
                "segments": [
                    { "carrierCode": "LH", "departure": { "at": "2026-09-10T07:10" },
                      "arrival": { "at": "2026-09-10T13:40" } },
                    { "carrierCode": "LH", "departure": { "at": "2026-09-10T15:00" },
                      "arrival": { "at": "2026-09-10T23:55" } }
                ]
            }]
        });
        let record = flight_record(&offer).unwrap();
        assert_eq!(record.id, "1");
        assert_eq!(record.price, Some(512.30));
        assert_eq!(record.name, "LH 1 stop");
        assert_eq!(record.details["stops"], 1);
    }
}
