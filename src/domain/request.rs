use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    pub passengers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotelQuery {
    pub city: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub adults: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceQuery {
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proximity_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f32>,
    pub max_results: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferences: Vec<String>,
}

/// The original user request an agent was invoked with. Immutable across
/// one HIL cycle; continuation messages restate it verbatim so refinement
/// turns never lose the location or dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchRequest {
    Flight(FlightQuery),
    Hotel(HotelQuery),
    Restaurant(PlaceQuery),
    Attraction(PlaceQuery),
}

impl SearchRequest {
    pub fn domain_name(&self) -> &'static str {
        match self {
            SearchRequest::Flight(_) => "flight",
            SearchRequest::Hotel(_) => "hotel",
            SearchRequest::Restaurant(_) => "restaurant",
            SearchRequest::Attraction(_) => "attraction",
        }
    }

    /// Canonical restatement of the original request, prefixed to every
    /// continuation message so the model keeps the search anchored.
    pub fn restate(&self) -> String {
        match self {
            SearchRequest::Flight(q) => {
                let mut text = format!(
                    "CONTEXT: You are searching for flights from {} to {} departing {}",
                    q.origin, q.destination, q.departure_date
                );
                if let Some(ret) = &q.return_date {
                    text.push_str(&format!(", returning {ret}"));
                }
                text.push_str(&format!(" for {} passenger(s).", q.passengers));
                text
            }
            SearchRequest::Hotel(q) => format!(
                "CONTEXT: You are searching for hotels in {} from {} to {} for {} adult(s).",
                q.city, q.check_in_date, q.check_out_date, q.adults
            ),
            SearchRequest::Restaurant(q) => {
                let mut text = format!("CONTEXT: You are searching for restaurants in {}", q.city);
                if let Some(near) = &q.proximity_location {
                    text.push_str(&format!(" near {near}"));
                }
                text.push('.');
                text
            }
            SearchRequest::Attraction(q) => {
                let mut text = format!("CONTEXT: You are searching for attractions in {}", q.city);
                if let Some(near) = &q.proximity_location {
                    text.push_str(&format!(" near {near}"));
                }
                text.push('.');
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_restatement_includes_dates() {
        let request = SearchRequest::Flight(FlightQuery {
            origin: "JFK".into(),
            destination: "MAD".into(),
            departure_date: "2026-09-10".into(),
            return_date: Some("2026-09-17".into()),
            passengers: 2,
        });
        let text = request.restate();
        assert!(text.starts_with("CONTEXT:"));
        assert!(text.contains("JFK"));
        assert!(text.contains("2026-09-17"));
        assert!(text.contains("2 passenger(s)"));
    }

    #[test]
    fn restaurant_restatement_includes_proximity() {
        let request = SearchRequest::Restaurant(PlaceQuery {
            city: "Madrid".into(),
            proximity_location: Some("Hotel Ritz".into()),
            min_rating: None,
            max_results: 15,
            preferences: vec![],
        });
        assert!(request.restate().contains("near Hotel Ritz"));
    }
}
