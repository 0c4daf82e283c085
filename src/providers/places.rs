//! Google Places text-search client for restaurants and attractions.
//!
//! Uses the legacy text-search endpoint. Soft constraints (cuisines,
//! atmosphere, proximity) are folded into the query text; `min_rating`
//! is enforced client-side because the API has no rating filter.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{PlaceCriteria, PlaceKind, PlaceProvider, ProviderError};
use crate::domain::ResultRecord;

pub struct GooglePlacesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GooglePlacesClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn build_query(kind: PlaceKind, criteria: &PlaceCriteria) -> String {
        let mut terms: Vec<String> = Vec::new();
        terms.push("best".to_string());
        terms.extend(criteria.cuisine_types.iter().cloned());
        terms.extend(criteria.dietary_restrictions.iter().cloned());
        terms.extend(criteria.atmosphere.iter().cloned());
        terms.push(kind.query_noun().to_string());
        match &criteria.proximity_location {
            Some(near) => terms.push(format!("near {near} in {}", criteria.city)),
            None => terms.push(format!("in {}", criteria.city)),
        }
        terms.join(" ")
    }
}

#[async_trait]
impl PlaceProvider for GooglePlacesClient {
    async fn search_places(
        &self,
        kind: PlaceKind,
        criteria: &PlaceCriteria,
    ) -> Result<Vec<ResultRecord>, ProviderError> {
        let url = format!("{}/textsearch/json", self.base_url);
        let query_text = Self::build_query(kind, criteria);
        let mut query = vec![
            ("query", query_text.clone()),
            ("type", kind.api_type().to_string()),
            ("key", self.api_key.clone()),
        ];
        if criteria.open_now == Some(true) {
            query.push(("opennow", "true".to_string()));
        }
        if let Some(level) = criteria.price_level {
            query.push(("maxprice", level.to_string()));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        // The endpoint reports its own status inside a 200 body
        match body["status"].as_str() {
            Some("OK") | Some("ZERO_RESULTS") => {}
            Some(other) => {
                return Err(ProviderError::Api {
                    status: 200,
                    message: format!(
                        "places status {other}: {}",
                        body["error_message"].as_str().unwrap_or("")
                    ),
                });
            }
            None => return Err(ProviderError::Malformed("missing status field".into())),
        }

        let results = body["results"].as_array().cloned().unwrap_or_default();
        debug!(query = %query_text, count = results.len(), "places search returned");

        Ok(results
            .iter()
            .filter_map(place_record)
            .filter(|r| match (criteria.min_rating, r.rating) {
                (Some(min), Some(rating)) => rating >= min,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .take(criteria.max_results)
            .collect())
    }
}

fn place_record(place: &Value) -> Option<ResultRecord> {
    let id = place["place_id"].as_str()?.to_string();
    let name = place["name"].as_str()?.to_string();
    Some(ResultRecord {
        id,
        name,
        price: None,
        rating: place["rating"].as_f64().map(|r| r as f32),
        address: place["formatted_address"].as_str().map(str::to_string),
        schedule: place["opening_hours"]["open_now"]
            .as_bool()
            .map(|open| if open { "open now" } else { "closed now" }.to_string()),
        details: json!({
            "price_level": place["price_level"],
            "user_ratings_total": place["user_ratings_total"],
            "types": place["types"],
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_folds_constraints_and_proximity() {
        let criteria = PlaceCriteria {
            city: "Madrid".into(),
            cuisine_types: vec!["italian".into()],
            dietary_restrictions: vec!["vegetarian".into()],
            proximity_location: Some("Gran Via Palace".into()),
            ..Default::default()
        };
        let q = GooglePlacesClient::build_query(PlaceKind::Restaurant, &criteria);
        assert_eq!(
            q,
            "best italian vegetarian restaurants near Gran Via Palace in Madrid"
        );
    }

    #[test]
    fn attraction_query_uses_attraction_noun() {
        let criteria = PlaceCriteria {
            city: "Kyoto".into(),
            ..Default::default()
        };
        let q = GooglePlacesClient::build_query(PlaceKind::Attraction, &criteria);
        assert_eq!(q, "best tourist attractions in Kyoto");
    }

    #[test]
    fn parses_place_result() {
        let place = json!({
            "place_id": "abc123",
            "name": "Casa Lucio",
            "rating": 4.5,
            "price_level": 3,
            "formatted_address": "Cava Baja 35, Madrid",
            "opening_hours": { "open_now": true }
        });
        let record = place_record(&place).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.schedule.as_deref(), Some("open now"));
    }
}
