//! Hotel search specialty over a [`HotelProvider`].

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
use crate::providers::{HotelCriteria, HotelProvider};

pub struct HotelSpecialty {
    provider: Arc<dyn HotelProvider>,
}

impl HotelSpecialty {
    pub fn new(provider: Arc<dyn HotelProvider>) -> Self {
        Self { provider }
    }
}

enum HotelTool {
    Search(HotelCriteria),
    Analyze(AnalyzeArgs),
    Reflect(ReflectArgs),
    Recommend(RecommendArgs),
    Finalize(FinalizeArgs),
}

impl HotelTool {
    fn parse(call: &ToolCall) -> Result<Self, ToolFault> {
        let args = call.arguments.clone();
        match call.name.as_str() {
            "SearchHotels" => serde_json::from_value(args)
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

/// Rating descending, then price ascending, then id.
fn rank_hotels(records: &mut [ResultRecord], goal: Option<&str>) {
    match goal {
        Some("best_value") => records.sort_by(|a, b| {
            cmp_price(a, b)
                .then(cmp_rating(b, a))
                .then(a.id.cmp(&b.id))
        }),
        _ => records.sort_by(|a, b| {
            cmp_rating(b, a)
                .then(cmp_price(a, b))
                .then(a.id.cmp(&b.id))
        }),
    }
}

fn cmp_rating(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    match (a.rating, b.rating) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_price(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    match (a.price, b.price) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl Specialty for HotelSpecialty {
    fn name(&self) -> &'static str {
        "hotel"
    }

    fn system_prompt(&self) -> String {
        "You are a hotel search specialist. Work strictly through your tools: \
         call SearchHotels with a 3-letter IATA city code (for example MAD for \
         Madrid), AnalyzeAndFilter to rank accumulated offers, \
         ReflectAndModifySearch before retrying with changed parameters, and \
         ProvideRecommendation once you have two or three strong options. If a \
         search fails because of an invalid city code, correct the code and \
         retry. When the user message contains FINAL_CHOICE_TRIGGER, call \
         FinalizeSelection with the selected id immediately. Never answer in \
         plain prose."
            .to_string()
    }

    fn opening_prompt(&self, request: &SearchRequest) -> String {
        match request {
            SearchRequest::Hotel(q) => format!(
                "Find hotels in {} from {} to {} for {} adult(s). Search, analyze \
                 the options, and recommend the best ones.",
                q.city, q.check_in_date, q.check_out_date, q.adults
            ),
            other => format!("Find hotels for this trip request: {}", other.restate()),
        }
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            declaration_for::<HotelCriteria>(
                "SearchHotels",
                "Search hotel offers in an IATA city code for a date range",
            ),
            declaration_for::<AnalyzeArgs>(
                "AnalyzeAndFilter",
                "Rank accumulated offers; goals: highest_rated (default), best_value",
            ),
            declaration_for::<ReflectArgs>(
                "ReflectAndModifySearch",
                "Record why current results fall short before searching again",
            ),
            declaration_for::<RecommendArgs>(
                "ProvideRecommendation",
                "Present the top options to the user and pause for their decision",
            ),
            declaration_for::<FinalizeArgs>(
                "FinalizeSelection",
                "Confirm the user's chosen hotel id",
            ),
        ]
    }

    async fn handle_tool(
        &self,
        call: &ToolCall,
        session: &mut AgentSession,
    ) -> Result<ToolOutcome, ToolFault> {
        match HotelTool::parse(call)? {
            HotelTool::Search(criteria) => {
                let batch = self.provider.search_hotels(&criteria).await?;
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
            HotelTool::Analyze(args) => {
                let mut ranked = session.results.records().to_vec();
                rank_hotels(&mut ranked, args.analysis_goal.as_deref());
                ranked.truncate(args.top_n.unwrap_or(3));
                session.shortlist = ranked.iter().map(|r| r.id.clone()).collect();
                Ok(ToolOutcome::Feedback(json!({
                    "success": true,
                    "goal": args.analysis_goal,
                    "ranked": ranked,
                })))
            }
            HotelTool::Reflect(args) => Ok(ToolOutcome::Feedback(json!({
                "success": true,
                "noted": args.reasoning,
            }))),
            HotelTool::Recommend(args) => {
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
            HotelTool::Finalize(args) => Ok(ToolOutcome::Finalize {
                id: args.selected_id,
                confirmation: args.confirmation_message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotel(id: &str, rating: f32, price: f64) -> ResultRecord {
        let mut record = ResultRecord::new(id, format!("hotel {id}"));
        record.rating = Some(rating);
        record.price = Some(price);
        record
    }

    #[test]
    fn default_ranking_prefers_rating_then_price() {
        let mut records = vec![
            hotel("a", 4.2, 100.0),
            hotel("b", 4.8, 250.0),
            hotel("c", 4.8, 200.0),
        ];
        rank_hotels(&mut records, None);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn best_value_ranks_by_price_first() {
        let mut records = vec![hotel("a", 4.8, 250.0), hotel("b", 4.2, 100.0)];
        rank_hotels(&mut records, Some("best_value"));
        assert_eq!(records[0].id, "b");
    }
}
