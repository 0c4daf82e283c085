//! Itinerary generation: a single model call over the finalized trip
//! pieces, with a deterministic fallback when the output fails to parse.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::agents::conversation::Message;
use crate::agents::error::AgentResult;
use crate::agents::llm::LlmProvider;
use crate::domain::ResultRecord;

/// Everything the day-planner needs after both HIL phases finished.
#[derive(Debug, Clone)]
pub struct TripContext {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub flight: Option<ResultRecord>,
    pub hotel: Option<ResultRecord>,
    pub restaurants: Vec<ResultRecord>,
    pub attractions: Vec<ResultRecord>,
}

pub struct ItineraryAgent {
    llm: Arc<dyn LlmProvider>,
}

impl ItineraryAgent {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Produce a day-by-day JSON plan. Model output that is not valid
    /// JSON degrades to a round-robin schedule instead of an error.
    pub async fn generate(&self, context: &TripContext) -> AgentResult<Value> {
        let messages = vec![
            Message::system(
                "You are a travel itinerary planner. Respond with a single JSON \
                 object of the form {\"days\": [{\"date\": ..., \"morning\": ..., \
                 \"lunch\": ..., \"afternoon\": ..., \"dinner\": ...}]} and \
                 nothing else. Use only the restaurants and attractions provided; \
                 do not repeat a restaurant across days unless the list is short.",
            ),
            Message::user(self.build_prompt(context)),
        ];

        let reply = self.llm.converse(&messages, &[]).await?;
        let cleaned = strip_json_fences(&reply.text);
        match serde_json::from_str::<Value>(cleaned) {
            Ok(plan) if plan.get("days").map_or(false, Value::is_array) => {
                info!(days = plan["days"].as_array().map(Vec::len), "itinerary generated");
                Ok(plan)
            }
            Ok(_) | Err(_) => {
                warn!("itinerary output did not parse, using round-robin fallback");
                Ok(fallback_plan(context))
            }
        }
    }

    fn build_prompt(&self, context: &TripContext) -> String {
        let mut prompt = format!(
            "Plan each day of a trip to {} from {} to {}.",
            context.destination, context.start_date, context.end_date
        );
        if let Some(flight) = &context.flight {
            prompt.push_str(&format!(
                "\nFlight: {} ({}).",
                flight.name,
                flight.schedule.as_deref().unwrap_or("schedule unknown")
            ));
        }
        if let Some(hotel) = &context.hotel {
            prompt.push_str(&format!("\nStaying at: {}.", hotel.name));
        }
        prompt.push_str("\nRestaurants:");
        for r in &context.restaurants {
            prompt.push_str(&format!("\n- {} (id {})", r.name, r.id));
        }
        prompt.push_str("\nAttractions:");
        for a in &context.attractions {
            prompt.push_str(&format!("\n- {} (id {})", a.name, a.id));
        }
        prompt
    }
}

fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Deterministic schedule: attractions round-robin into morning and
/// afternoon slots, restaurants into lunch and dinner.
fn fallback_plan(context: &TripContext) -> Value {
    let days = trip_days(&context.start_date, &context.end_date);
    let pick = |records: &[ResultRecord], index: usize| -> Value {
        if records.is_empty() {
            Value::String("free time".to_string())
        } else {
            json!(records[index % records.len()].name)
        }
    };

    let mut plan = Vec::new();
    for (i, date) in days.iter().enumerate() {
        plan.push(json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "morning": pick(&context.attractions, i * 2),
            "lunch": pick(&context.restaurants, i * 2),
            "afternoon": pick(&context.attractions, i * 2 + 1),
            "dinner": pick(&context.restaurants, i * 2 + 1),
        }));
    }
    json!({ "days": plan, "generated": "fallback" })
}

fn trip_days(start: &str, end: &str) -> Vec<NaiveDate> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d");
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d");
    match (start, end) {
        (Ok(start), Ok(end)) if end >= start => start.iter_days().take_while(|d| *d <= end).collect(),
        (Ok(start), _) => vec![start],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::llm::{ModelTurn, ScriptedProvider};

    fn context() -> TripContext {
        TripContext {
            destination: "Madrid".into(),
            start_date: "2026-09-10".into(),
            end_date: "2026-09-12".into(),
            flight: None,
            hotel: None,
            restaurants: vec![
                ResultRecord::new("r1", "Casa Lucio"),
                ResultRecord::new("r2", "Verde Oliva"),
            ],
            attractions: vec![ResultRecord::new("a1", "Royal Palace")],
        }
    }

    #[test]
    fn strips_fenced_json() {
        assert_eq!(strip_json_fences("```json\n{\"days\":[]}\n```"), "{\"days\":[]}");
        assert_eq!(strip_json_fences("{\"days\":[]}"), "{\"days\":[]}");
    }

    #[test]
    fn fallback_covers_every_day() {
        let plan = fallback_plan(&context());
        let days = plan["days"].as_array().unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0]["date"], "2026-09-10");
        assert_eq!(days[2]["date"], "2026-09-12");
        assert_eq!(days[0]["morning"], "Royal Palace");
    }

    #[tokio::test]
    async fn unparseable_output_falls_back() {
        let llm = Arc::new(ScriptedProvider::new(vec![ModelTurn::text(
            "Day 1: have fun!",
        )]));
        let agent = ItineraryAgent::new(llm);
        let plan = agent.generate(&context()).await.unwrap();
        assert_eq!(plan["generated"], "fallback");
        assert_eq!(plan["days"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn valid_model_json_is_used_directly() {
        let llm = Arc::new(ScriptedProvider::new(vec![ModelTurn::text(
            "```json\n{\"days\": [{\"date\": \"2026-09-10\"}]}\n```",
        )]));
        let agent = ItineraryAgent::new(llm);
        let plan = agent.generate(&context()).await.unwrap();
        assert!(plan.get("generated").is_none());
        assert_eq!(plan["days"][0]["date"], "2026-09-10");
    }
}
