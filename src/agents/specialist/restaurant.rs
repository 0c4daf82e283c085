//! Restaurant search specialty over a [`PlaceProvider`].

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{
    invalid_args, AgentSession, AnalyzeArgs, FinalizeArgs, Recommendation, RecommendArgs,
    ReflectArgs, Specialty, ToolOutcome,
};
use crate::agents::error::ToolFault;
use crate::agents::tools::{declaration_for, ToolCall, ToolDefinition};
use crate::domain::{ResultRecord, SearchRequest};
use crate::providers::{PlaceCriteria, PlaceKind, PlaceProvider};

pub struct RestaurantSpecialty {
    provider: Arc<dyn PlaceProvider>,
}

impl RestaurantSpecialty {
    pub fn new(provider: Arc<dyn PlaceProvider>) -> Self {
        Self { provider }
    }
}

enum RestaurantTool {
    Search(PlaceCriteria),
    Analyze(AnalyzeArgs),
    Reflect(ReflectArgs),
    Recommend(RecommendArgs),
    Finalize(FinalizeArgs),
}

impl RestaurantTool {
    fn parse(call: &ToolCall) -> Result<Self, ToolFault> {
        let args = call.arguments.clone();
        match call.name.as_str() {
            "SearchRestaurants" => serde_json::from_value(args)
                .map(Self::Search)
                .map_err(invalid_args),
            "AnalyzeAndFilter" => serde_json::from_value(args)
                .map(Self::Analyze)
                .map_err(invalid_args),
            "ReflectAndModifySearch" => serde_json::from_value(args)
                .map(Self::Reflect)
                .map_err(invalid_args),
            "ProvideRecommendation" => serde_json::from_value(args)
                .map(Self::Recommend)
                .map_err(invalid_args),
            "FinalizeSelection" => serde_json::from_value(args)
                .map(Self::Finalize)
                .map_err(invalid_args),
            other => Err(ToolFault::UnknownTool(other.to_string())),
        }
    }
}

/// Analysis goals carried over from the place search backends:
/// highest_rated (default), best_value (rating per price level), and
/// closest_to_proximity_location, which keeps the provider's own
/// proximity-biased order.
pub(crate) fn rank_places(records: &mut [ResultRecord], goal: Option<&str>) {
    match goal {
        Some("closest_to_proximity_location") => {}
        Some("best_value") => records.sort_by(|a, b| {
            value_score(b)
                .partial_cmp(&value_score(a))
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        }),
        _ => records.sort_by(|a, b| {
            cmp_rating(b, a).then(a.id.cmp(&b.id))
        }),
    }
}

fn value_score(record: &ResultRecord) -> f64 {
    let rating = record.rating.unwrap_or(0.0) as f64;
    let price_level = record.details["price_level"].as_u64().unwrap_or(2).max(1) as f64;
    rating / price_level
}

fn cmp_rating(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    match (a.rating, b.rating) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl Specialty for RestaurantSpecialty {
    fn name(&self) -> &'static str {
        "restaurant"
    }

    fn system_prompt(&self) -> String {
        "You are a restaurant scout. Work strictly through your tools: call \
         SearchRestaurants with the city and any cuisine, dietary, atmosphere or \
         price constraints, AnalyzeAndFilter to rank what you found, \
         ReflectAndModifySearch before retrying with changed constraints, and \
         ProvideRecommendation with a varied shortlist. When the user message \
         contains FINAL_CHOICE_TRIGGER, call FinalizeSelection with the selected \
         id immediately. Never answer in plain prose."
            .to_string()
    }

    fn opening_prompt(&self, request: &SearchRequest) -> String {
        match request {
            SearchRequest::Restaurant(q) => {
                let mut text = format!("Find good restaurants in {}", q.city);
                if let Some(near) = &q.proximity_location {
                    text.push_str(&format!(", prioritizing places near {near}"));
                }
                if let Some(min) = q.min_rating {
                    text.push_str(&format!(", rated at least {min}"));
                }
                if !q.preferences.is_empty() {
                    text.push_str(&format!(
                        ". The traveler's preferences: {}",
                        q.preferences.join(", ")
                    ));
                }
                text.push_str(&format!(
                    ". Gather up to {} options, then recommend a varied shortlist.",
                    q.max_results
                ));
                text
            }
            other => format!("Find restaurants for this trip: {}", other.restate()),
        }
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            declaration_for::<PlaceCriteria>(
                "SearchRestaurants",
                "Search restaurants in a city with optional constraint filters",
            ),
            declaration_for::<AnalyzeArgs>(
                "AnalyzeAndFilter",
                "Rank found restaurants; goals: highest_rated (default), best_value, \
                 closest_to_proximity_location",
            ),
            declaration_for::<ReflectArgs>(
                "ReflectAndModifySearch",
                "Record why current results fall short before searching again",
            ),
            declaration_for::<RecommendArgs>(
                "ProvideRecommendation",
                "Present the shortlist to the user and pause for their decision",
            ),
            declaration_for::<FinalizeArgs>(
                "FinalizeSelection",
                "Confirm the user's chosen restaurant id",
            ),
        ]
    }

    async fn handle_tool(
        &self,
        call: &ToolCall,
        session: &mut AgentSession,
    ) -> Result<ToolOutcome, ToolFault> {
        match RestaurantTool::parse(call)? {
            RestaurantTool::Search(criteria) => {
                let batch = self
                    .provider
                    .search_places(PlaceKind::Restaurant, &criteria)
                    .await?;
                let found = batch.len();
                let added = session.results.absorb(batch);
                Ok(ToolOutcome::Feedback(json!({
                    "success": true,
                    "found_this_call": found,
                    "new_results": added,
                    "total_stored": session.results.len(),
                    "sample": session.results.top(5),
                })))
            }
            RestaurantTool::Analyze(args) => {
                let mut ranked = session.results.records().to_vec();
                rank_places(&mut ranked, args.analysis_goal.as_deref());
                ranked.truncate(args.top_n.unwrap_or(5));
                session.shortlist = ranked.iter().map(|r| r.id.clone()).collect();
                Ok(ToolOutcome::Feedback(json!({
                    "success": true,
                    "goal": args.analysis_goal,
                    "ranked": ranked,
                })))
            }
            RestaurantTool::Reflect(args) => Ok(ToolOutcome::Feedback(json!({
                "success": true,
                "noted": args.reasoning,
            }))),
            RestaurantTool::Recommend(args) => {
                if args.top_ids.is_empty() {
                    return Err(ToolFault::InvalidArguments(
                        "top_ids must not be empty".to_string(),
                    ));
                }
                Ok(ToolOutcome::Pause(Recommendation {
                    ids: args.top_ids,
                    reasoning: args.reasoning,
                    summary: args.summary,
                }))
            }
            RestaurantTool::Finalize(args) => Ok(ToolOutcome::Finalize {
                id: args.selected_id,
                confirmation: args.confirmation_message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(id: &str, rating: f32, price_level: u64) -> ResultRecord {
        let mut record = ResultRecord::new(id, format!("place {id}"));
        record.rating = Some(rating);
        record.details = json!({ "price_level": price_level });
        record
    }

    #[test]
    fn best_value_prefers_high_rating_at_low_price() {
        let mut records = vec![place("a", 4.8, 4), place("b", 4.2, 1)];
        rank_places(&mut records, Some("best_value"));
        assert_eq!(records[0].id, "b");
    }

    #[test]
    fn proximity_goal_keeps_provider_order() {
        let mut records = vec![place("far", 4.9, 2), place("near", 4.0, 2)];
        let before: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        rank_places(&mut records, Some("closest_to_proximity_location"));
        let after: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(before, after);
    }
}
