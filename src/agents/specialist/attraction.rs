//! Attraction search specialty over a [`PlaceProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::restaurant::rank_places;
use super::{
    invalid_args, AgentSession, AnalyzeArgs, FinalizeArgs, Recommendation, RecommendArgs,
    ReflectArgs, Specialty, ToolOutcome,
};
use crate::agents::error::ToolFault;
use crate::agents::tools::{declaration_for, ToolCall, ToolDefinition};
use crate::domain::SearchRequest;
use crate::providers::{PlaceCriteria, PlaceKind, PlaceProvider};

pub struct AttractionSpecialty {
    provider: Arc<dyn PlaceProvider>,
}

impl AttractionSpecialty {
    pub fn new(provider: Arc<dyn PlaceProvider>) -> Self {
        Self { provider }
    }
}

enum AttractionTool {
    Search(PlaceCriteria),
    Analyze(AnalyzeArgs),
    Reflect(ReflectArgs),
    Recommend(RecommendArgs),
    Finalize(FinalizeArgs),
}

impl AttractionTool {
    fn parse(call: &ToolCall) -> Result<Self, ToolFault> {
        let args = call.arguments.clone();
        match call.name.as_str() {
            "SearchAttractions" => serde_json::from_value(args)
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

#[async_trait]
impl Specialty for AttractionSpecialty {
    fn name(&self) -> &'static str {
        "attraction"
    }

    fn system_prompt(&self) -> String {
        "You are a sightseeing scout. Work strictly through your tools: call \
         SearchAttractions with the city and the traveler's interests, \
         AnalyzeAndFilter to rank what you found, ReflectAndModifySearch before \
         retrying with changed constraints, and ProvideRecommendation with a \
         varied shortlist covering different kinds of attractions. When the user \
         message contains FINAL_CHOICE_TRIGGER, call FinalizeSelection with the \
         selected id immediately. Never answer in plain prose."
            .to_string()
    }

    fn opening_prompt(&self, request: &SearchRequest) -> String {
        match request {
            SearchRequest::Attraction(q) => {
                let mut text = format!("Find attractions worth visiting in {}", q.city);
                if let Some(near) = &q.proximity_location {
                    text.push_str(&format!(", prioritizing places near {near}"));
                }
                if !q.preferences.is_empty() {
                    text.push_str(&format!(
                        ". The traveler's interests: {}",
                        q.preferences.join(", ")
                    ));
                }
                text.push_str(&format!(
                    ". Gather up to {} options, then recommend a varied shortlist.",
                    q.max_results
                ));
                text
            }
            other => format!("Find attractions for this trip: {}", other.restate()),
        }
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            declaration_for::<PlaceCriteria>(
                "SearchAttractions",
                "Search tourist attractions in a city with optional filters",
            ),
            declaration_for::<AnalyzeArgs>(
                "AnalyzeAndFilter",
                "Rank found attractions; goals: highest_rated (default), \
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
                "Confirm the user's chosen attraction id",
            ),
        ]
    }

    async fn handle_tool(
        &self,
        call: &ToolCall,
        session: &mut AgentSession,
    ) -> Result<ToolOutcome, ToolFault> {
        match AttractionTool::parse(call)? {
            AttractionTool::Search(criteria) => {
                let batch = self
                    .provider
                    .search_places(PlaceKind::Attraction, &criteria)
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
            AttractionTool::Analyze(args) => {
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
            AttractionTool::Reflect(args) => Ok(ToolOutcome::Feedback(json!({
                "success": true,
                "noted": args.reasoning,
            }))),
            AttractionTool::Recommend(args) => {
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
            AttractionTool::Finalize(args) => Ok(ToolOutcome::Finalize {
                id: args.selected_id,
                confirmation: args.confirmation_message,
            }),
        }
    }
}
