//! Flight search specialty over a [`FlightProvider`].

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
use crate::providers::{FlightCriteria, FlightProvider};

pub struct FlightSpecialty {
    provider: Arc<dyn FlightProvider>,
}

impl FlightSpecialty {
    pub fn new(provider: Arc<dyn FlightProvider>) -> Self {
        Self { provider }
    }
}

/// The closed tool vocabulary of the flight agent. Anything else the
/// model asks for is an unknown-tool fault.
enum FlightTool {
    Search(FlightCriteria),
    Analyze(AnalyzeArgs),
    Reflect(ReflectArgs),
    Recommend(RecommendArgs),
    Finalize(FinalizeArgs),
}

impl FlightTool {
    fn parse(call: &ToolCall) -> Result<Self, ToolFault> {
        let args = call.arguments.clone();
        match call.name.as_str() {
            "SearchFlights" => serde_json::from_value(args)
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

/// Price ascending, then stop count, then id for a stable total order.
fn rank_flights(records: &mut [ResultRecord], goal: Option<&str>) {
    match goal {
        Some("fewest_stops") => records.sort_by(|a, b| {
            stops(a)
                .cmp(&stops(b))
                .then(cmp_price(a, b))
                .then(a.id.cmp(&b.id))
        }),
        _ => records.sort_by(|a, b| {
            cmp_price(a, b)
                .then(stops(a).cmp(&stops(b)))
                .then(a.id.cmp(&b.id))
        }),
    }
}

fn stops(record: &ResultRecord) -> u64 {
    record.details["stops"].as_u64().unwrap_or(u64::MAX)
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
impl Specialty for FlightSpecialty {
    fn name(&self) -> &'static str {
        "flight"
    }

    fn system_prompt(&self) -> String {
        "You are a flight search specialist. Work strictly through your tools: \
         call SearchFlights with IATA codes to gather offers, AnalyzeAndFilter to \
         rank what you have, ReflectAndModifySearch before retrying with changed \
         parameters, and ProvideRecommendation once you have two or three strong \
         options to present. When the user message contains FINAL_CHOICE_TRIGGER, \
         call FinalizeSelection with the selected id immediately. Never answer in \
         plain prose."
            .to_string()
    }

    fn opening_prompt(&self, request: &SearchRequest) -> String {
        match request {
            SearchRequest::Flight(q) => {
                let mut text = format!(
                    "Find flights from {} to {} departing {}",
                    q.origin, q.destination, q.departure_date
                );
                if let Some(ret) = &q.return_date {
                    text.push_str(&format!(", returning {ret}"));
                }
                text.push_str(&format!(
                    " for {} passenger(s). Search, analyze the options, and recommend the best ones.",
                    q.passengers
                ));
                text
            }
            other => format!(
                "Find flights for this trip request: {}",
                other.restate()
            ),
        }
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            declaration_for::<FlightCriteria>(
                "SearchFlights",
                "Search flight offers between two IATA locations on given dates",
            ),
            declaration_for::<AnalyzeArgs>(
                "AnalyzeAndFilter",
                "Rank accumulated offers; goals: cheapest (default), fewest_stops",
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
                "Confirm the user's chosen offer id",
            ),
        ]
    }

    async fn handle_tool(
        &self,
        call: &ToolCall,
        session: &mut AgentSession,
    ) -> Result<ToolOutcome, ToolFault> {
        match FlightTool::parse(call)? {
            FlightTool::Search(criteria) => {
                let batch = self.provider.search_flights(&criteria).await?;
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
            FlightTool::Analyze(args) => {
                let mut ranked = session.results.records().to_vec();
                rank_flights(&mut ranked, args.analysis_goal.as_deref());
                ranked.truncate(args.top_n.unwrap_or(3));
                session.shortlist = ranked.iter().map(|r| r.id.clone()).collect();
                Ok(ToolOutcome::Feedback(json!({
                    "success": true,
                    "goal": args.analysis_goal,
                    "ranked": ranked,
                })))
            }
            FlightTool::Reflect(args) => Ok(ToolOutcome::Feedback(json!({
                "success": true,
                "noted": args.reasoning,
            }))),
            FlightTool::Recommend(args) => {
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
            FlightTool::Finalize(args) => Ok(ToolOutcome::Finalize {
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

    fn flight(id: &str, price: f64, stops: u64) -> ResultRecord {
        let mut record = ResultRecord::new(id, format!("flight {id}"));
        record.price = Some(price);
        record.details = json!({ "stops": stops });
        record
    }

    #[test]
    fn default_ranking_is_cheapest_first() {
        let mut records = vec![flight("a", 600.0, 0), flight("b", 500.0, 1), flight("c", 500.0, 0)];
        rank_flights(&mut records, None);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let mut once = vec![flight("a", 600.0, 0), flight("b", 500.0, 1)];
        rank_flights(&mut once, Some("fewest_stops"));
        let mut twice = once.clone();
        rank_flights(&mut twice, Some("fewest_stops"));
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_tool_is_a_recoverable_fault() {
        let call = ToolCall::new("call_0", "BookFlight", json!({}));
        match FlightTool::parse(&call) {
            Err(ToolFault::UnknownTool(name)) => assert_eq!(name, "BookFlight"),
            _ => panic!("expected unknown-tool fault"),
        }
    }

    #[test]
    fn malformed_arguments_are_a_recoverable_fault() {
        let call = ToolCall::new("call_0", "SearchFlights", json!({ "origin": 42 }));
        assert!(matches!(
            FlightTool::parse(&call),
            Err(ToolFault::InvalidArguments(_))
        ));
    }
}
