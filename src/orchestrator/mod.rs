//! Two-phase trip orchestration.
//!
//! Phase 1 runs the flight and then the hotel agent, each pausing for a
//! human decision. Phase 2 runs restaurants, attractions and the
//! itinerary automatically, biased toward the chosen hotel.

pub mod session;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::agents::conversation::Message;
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::llm::LlmProvider;
use crate::agents::specialist::{
    AgentOutcome, AgentSession, ItineraryAgent, SpecialistAgent, TripContext,
};
use crate::agents::tools::declaration_for;
use crate::domain::{
    FlightQuery, HotelQuery, PlaceQuery, ResultRecord, SearchRequest, UserDecision,
};

pub use session::{OrchestrationSession, Phase, SessionStore, TripSelections};

/// Trip parameters extracted from the user's prompt by the parser turn.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TripParams {
    /// Origin airport or city, 3-letter IATA code
    pub origin: String,
    /// Destination airport or city, 3-letter IATA code
    pub destination: String,
    /// Destination city name, e.g. "Madrid"
    pub destination_city: String,
    /// Departure date, YYYY-MM-DD
    pub departure_date: String,
    /// Return date for round trips, YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    pub travelers: u32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct ClarifyArgs {
    /// Questions the user must answer before planning can start
    questions: Vec<String>,
}

/// The finished plan assembled at the end of Phase 2.
#[derive(Debug, Clone, Serialize)]
pub struct TripPlan {
    pub flight: Option<ResultRecord>,
    pub hotel: Option<ResultRecord>,
    pub restaurants: Vec<ResultRecord>,
    pub attractions: Vec<ResultRecord>,
    pub itinerary: Value,
}

/// What one orchestration round returns to the caller.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrchestrationResult {
    /// The prompt was missing details; answer and call orchestrate again
    ClarificationNeeded { questions: Vec<String> },
    /// An agent paused with recommendations; resume with a decision
    AwaitingUserInput {
        session_id: String,
        agent: String,
        recommendations: Vec<ResultRecord>,
        summary: String,
    },
    /// Both phases finished
    Complete { plan: TripPlan, summary: String },
    /// An agent ran out of budget before recommending anything
    Incomplete { summary: String },
}

pub struct Orchestrator {
    llm: Arc<dyn LlmProvider>,
    flight_agent: SpecialistAgent,
    hotel_agent: SpecialistAgent,
    restaurant_agent: SpecialistAgent,
    attraction_agent: SpecialistAgent,
    itinerary_agent: ItineraryAgent,
    sessions: SessionStore,
    phase2_results: usize,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        flight_agent: SpecialistAgent,
        hotel_agent: SpecialistAgent,
        restaurant_agent: SpecialistAgent,
        attraction_agent: SpecialistAgent,
        itinerary_agent: ItineraryAgent,
        phase2_results: usize,
    ) -> Self {
        Self {
            llm,
            flight_agent,
            hotel_agent,
            restaurant_agent,
            attraction_agent,
            itinerary_agent,
            sessions: SessionStore::new(),
            phase2_results,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Parse the user's prompt and, if it is complete, start Phase 1.
    pub async fn execute(
        &self,
        user_prompt: &str,
        clarification: Option<&str>,
    ) -> AgentResult<OrchestrationResult> {
        let mut prompt = user_prompt.to_string();
        if let Some(answer) = clarification {
            prompt.push_str(&format!("\n\nAdditional details: {answer}"));
        }

        let messages = vec![
            Message::system(
                "You coordinate a vacation-planning team. Extract the trip \
                 parameters from the user's message and call StartFlightSearch \
                 with IATA codes and ISO dates. If the origin, destination, dates \
                 or traveler count cannot be determined, call RequestClarification \
                 with the specific questions instead. Always call exactly one tool.",
            ),
            Message::user(prompt),
        ];
        let tools = vec![
            declaration_for::<TripParams>(
                "StartFlightSearch",
                "Begin planning with fully-determined trip parameters",
            ),
            declaration_for::<ClarifyArgs>(
                "RequestClarification",
                "Ask the user for the details missing from their request",
            ),
        ];

        let reply = self.llm.converse(&messages, &tools).await?;
        let Some(call) = reply.tool_calls.first() else {
            warn!("parser turn produced prose instead of a tool call");
            return Ok(OrchestrationResult::ClarificationNeeded {
                questions: vec![reply.text],
            });
        };

        match call.name.as_str() {
            "StartFlightSearch" => {
                let trip: TripParams = match serde_json::from_value(call.arguments.clone()) {
                    Ok(trip) => trip,
                    Err(e) => {
                        warn!(error = %e, "parser produced malformed trip parameters");
                        return Ok(OrchestrationResult::ClarificationNeeded {
                            questions: vec![
                                "Please restate your trip request with origin, \
                                 destination, dates and traveler count."
                                    .to_string(),
                            ],
                        });
                    }
                };
                info!(
                    origin = %trip.origin,
                    destination = %trip.destination,
                    "trip parsed, starting flight search"
                );
                let request = SearchRequest::Flight(FlightQuery {
                    origin: trip.origin.clone(),
                    destination: trip.destination.clone(),
                    departure_date: trip.departure_date.clone(),
                    return_date: trip.return_date.clone(),
                    passengers: trip.travelers,
                });
                let outcome = self.flight_agent.begin(request).await?;
                self.after_flight(trip, TripSelections::default(), outcome, None)
                    .await
            }
            "RequestClarification" => {
                let questions = match serde_json::from_value::<ClarifyArgs>(call.arguments.clone())
                {
                    Ok(args) => args.questions,
                    Err(e) => {
                        warn!(error = %e, "parser produced malformed clarification");
                        vec!["Please restate your trip request with origin, \
                              destination, dates and traveler count."
                            .to_string()]
                    }
                };
                Ok(OrchestrationResult::ClarificationNeeded { questions })
            }
            other => {
                warn!(tool = other, "parser called an undeclared tool");
                Ok(OrchestrationResult::ClarificationNeeded {
                    questions: vec!["Please restate your trip request with origin, \
                                     destination, dates and traveler count."
                        .to_string()],
                })
            }
        }
    }

    /// Resume a paused orchestration with the human's decision.
    pub async fn resume(
        &self,
        session_id: &str,
        decision: &UserDecision,
    ) -> AgentResult<OrchestrationResult> {
        let stored = self
            .sessions
            .remove(session_id)
            .await
            .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;

        match stored.phase {
            Phase::Flight => {
                let outcome = self.flight_agent.resume(stored.paused, decision).await?;
                self.after_flight(
                    stored.trip,
                    stored.selections,
                    outcome,
                    Some(session_id.to_string()),
                )
                .await
            }
            Phase::Hotel => {
                let outcome = self.hotel_agent.resume(stored.paused, decision).await?;
                self.after_hotel(
                    stored.trip,
                    stored.selections,
                    outcome,
                    Some(session_id.to_string()),
                )
                .await
            }
        }
    }

    async fn after_flight(
        &self,
        trip: TripParams,
        mut selections: TripSelections,
        outcome: AgentOutcome,
        session_id: Option<String>,
    ) -> AgentResult<OrchestrationResult> {
        match outcome {
            AgentOutcome::Paused {
                recommendations,
                summary,
                session,
            } => {
                let id = self
                    .store(trip, Phase::Flight, session, selections, session_id)
                    .await;
                Ok(OrchestrationResult::AwaitingUserInput {
                    session_id: id,
                    agent: "flight".to_string(),
                    recommendations,
                    summary,
                })
            }
            AgentOutcome::Finalized { selection, .. } => {
                selections.flight = selection;
                info!("flight finalized, starting hotel search");
                let request = SearchRequest::Hotel(HotelQuery {
                    city: trip.destination.clone(),
                    check_in_date: trip.departure_date.clone(),
                    check_out_date: hotel_check_out(
                        &trip.departure_date,
                        trip.return_date.as_deref(),
                    ),
                    adults: trip.travelers,
                });
                let outcome = self.hotel_agent.begin(request).await?;
                self.after_hotel(trip, selections, outcome, session_id).await
            }
            AgentOutcome::Incomplete { summary, .. } | AgentOutcome::NoResults { summary } => {
                Ok(OrchestrationResult::Incomplete { summary })
            }
        }
    }

    async fn after_hotel(
        &self,
        trip: TripParams,
        mut selections: TripSelections,
        outcome: AgentOutcome,
        session_id: Option<String>,
    ) -> AgentResult<OrchestrationResult> {
        match outcome {
            AgentOutcome::Paused {
                recommendations,
                summary,
                session,
            } => {
                let id = self
                    .store(trip, Phase::Hotel, session, selections, session_id)
                    .await;
                Ok(OrchestrationResult::AwaitingUserInput {
                    session_id: id,
                    agent: "hotel".to_string(),
                    recommendations,
                    summary,
                })
            }
            AgentOutcome::Finalized { selection, .. } => {
                selections.hotel = selection;
                self.run_phase2(trip, selections).await
            }
            AgentOutcome::Incomplete { summary, .. } | AgentOutcome::NoResults { summary } => {
                Ok(OrchestrationResult::Incomplete { summary })
            }
        }
    }

    async fn store(
        &self,
        trip: TripParams,
        phase: Phase,
        paused: AgentSession,
        selections: TripSelections,
        session_id: Option<String>,
    ) -> String {
        let session = OrchestrationSession {
            trip,
            phase,
            paused,
            selections,
        };
        match session_id {
            Some(id) => {
                self.sessions.insert(id.clone(), session).await;
                id
            }
            None => self.sessions.create(session).await,
        }
    }

    /// Restaurants, attractions and the itinerary run without pauses,
    /// anchored to the chosen hotel.
    async fn run_phase2(
        &self,
        trip: TripParams,
        selections: TripSelections,
    ) -> AgentResult<OrchestrationResult> {
        let proximity = selections.hotel.as_ref().map(|h| h.name.clone());
        info!(hotel = ?proximity, "phase 2 starting");

        let restaurant_request = SearchRequest::Restaurant(PlaceQuery {
            city: trip.destination_city.clone(),
            proximity_location: proximity.clone(),
            min_rating: None,
            max_results: self.phase2_results,
            preferences: Vec::new(),
        });
        let attraction_request = SearchRequest::Attraction(PlaceQuery {
            city: trip.destination_city.clone(),
            proximity_location: proximity,
            min_rating: None,
            max_results: self.phase2_results,
            preferences: Vec::new(),
        });

        let restaurants = harvest(self.restaurant_agent.begin(restaurant_request).await?);
        let attractions = harvest(self.attraction_agent.begin(attraction_request).await?);
        if restaurants.is_empty() {
            warn!("phase 2 found no restaurants");
        }
        if attractions.is_empty() {
            warn!("phase 2 found no attractions");
        }

        let context = TripContext {
            destination: trip.destination_city.clone(),
            start_date: trip.departure_date.clone(),
            end_date: trip
                .return_date
                .clone()
                .unwrap_or_else(|| trip.departure_date.clone()),
            flight: selections.flight.clone(),
            hotel: selections.hotel.clone(),
            restaurants: restaurants.clone(),
            attractions: attractions.clone(),
        };
        let itinerary = self.itinerary_agent.generate(&context).await?;

        Ok(OrchestrationResult::Complete {
            plan: TripPlan {
                flight: selections.flight,
                hotel: selections.hotel,
                restaurants,
                attractions,
                itinerary,
            },
            summary: format!(
                "Your trip to {} is planned: flight and hotel are booked in, with \
                 restaurants, attractions and a day-by-day itinerary.",
                trip.destination_city
            ),
        })
    }

    /// Run a single specialist once, for the debug endpoint.
    pub async fn run_specialist(
        &self,
        name: &str,
        request: SearchRequest,
    ) -> AgentResult<AgentOutcome> {
        let agent = match name {
            "flight" => &self.flight_agent,
            "hotel" => &self.hotel_agent,
            "restaurant" => &self.restaurant_agent,
            "attraction" => &self.attraction_agent,
            other => {
                return Err(AgentError::Configuration(format!("unknown agent: {other}")));
            }
        };
        agent.begin(request).await
    }
}

/// Hotel searches need at least a one-night stay; a missing or same-day
/// return date would otherwise be rejected by the hotel backend. ISO
/// dates compare lexicographically.
fn hotel_check_out(check_in: &str, return_date: Option<&str>) -> String {
    let next_day = chrono::NaiveDate::parse_from_str(check_in, "%Y-%m-%d")
        .map(|d| (d + chrono::Duration::days(1)).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| check_in.to_string());
    match return_date {
        Some(ret) if ret > next_day.as_str() => ret.to_string(),
        _ => next_day,
    }
}

/// Phase 2 auto-accept: take everything an agent accumulated, falling
/// back to whatever subset its outcome carries. Empty is acceptable.
fn harvest(outcome: AgentOutcome) -> Vec<ResultRecord> {
    match outcome {
        AgentOutcome::Paused {
            recommendations,
            session,
            ..
        } => {
            if session.results.is_empty() {
                recommendations
            } else {
                session.results.records().to_vec()
            }
        }
        AgentOutcome::Incomplete { shortlist, .. } => shortlist,
        AgentOutcome::Finalized { selection, .. } => selection.into_iter().collect(),
        AgentOutcome::NoResults { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResultSet;

    #[test]
    fn harvest_prefers_full_result_set_over_recommendations() {
        let mut results = ResultSet::new();
        results.absorb(vec![
            ResultRecord::new("a", "A"),
            ResultRecord::new("b", "B"),
        ]);
        let session = AgentSession {
            request: SearchRequest::Restaurant(PlaceQuery {
                city: "Madrid".into(),
                proximity_location: None,
                min_rating: None,
                max_results: 15,
                preferences: vec![],
            }),
            results,
            history: Vec::new(),
            shortlist: Vec::new(),
            pending: None,
            refinements_used: 0,
        };
        let harvested = harvest(AgentOutcome::Paused {
            recommendations: vec![ResultRecord::new("a", "A")],
            summary: String::new(),
            session,
        });
        assert_eq!(harvested.len(), 2);
    }

    #[test]
    fn check_out_is_at_least_one_night() {
        assert_eq!(hotel_check_out("2026-09-10", None), "2026-09-11");
        assert_eq!(hotel_check_out("2026-09-10", Some("2026-09-10")), "2026-09-11");
        assert_eq!(hotel_check_out("2026-09-10", Some("2026-09-12")), "2026-09-12");
        // Unparseable check-in passes through untouched
        assert_eq!(hotel_check_out("tomorrow", Some("2026-09-12")), "tomorrow");
    }

    #[test]
    fn harvest_of_no_results_is_empty() {
        let harvested = harvest(AgentOutcome::NoResults {
            summary: "nothing".into(),
        });
        assert!(harvested.is_empty());
    }
}
