//! The generic specialist agent: a bounded tool-calling loop driven over
//! a per-domain [`Specialty`], with the pause/resume protocol on top.

pub mod attraction;
pub mod flight;
pub mod hotel;
pub mod itinerary;
pub mod restaurant;

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::conversation::Message;
use super::error::{AgentResult, ToolFault};
use super::llm::LlmProvider;
use super::tools::{ToolCall, ToolDefinition};
use crate::domain::{ContinuationMessage, ResultRecord, ResultSet, SearchRequest, UserDecision};

pub use attraction::AttractionSpecialty;
pub use flight::FlightSpecialty;
pub use hotel::HotelSpecialty;
pub use itinerary::{ItineraryAgent, TripContext};
pub use restaurant::RestaurantSpecialty;

/// Loop budgets. Refinement rounds are counted separately from model
/// turns, so a refinement always gets a fresh full turn budget.
#[derive(Debug, Clone, Copy)]
pub struct TurnLimits {
    pub max_turns: u32,
    pub max_refinements: u32,
}

impl Default for TurnLimits {
    fn default() -> Self {
        Self {
            max_turns: 5,
            max_refinements: 2,
        }
    }
}

/// A pending recommendation awaiting a human decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub ids: Vec<String>,
    pub reasoning: String,
    pub summary: String,
}

/// Everything one agent invocation needs to pause and later resume.
/// Passed in and out by value; the agent itself holds no session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    pub request: SearchRequest,
    pub results: ResultSet,
    pub history: Vec<Message>,
    pub shortlist: Vec<String>,
    pub pending: Option<Recommendation>,
    pub refinements_used: u32,
}

impl AgentSession {
    fn new(request: SearchRequest, history: Vec<Message>) -> Self {
        Self {
            request,
            results: ResultSet::new(),
            history,
            shortlist: Vec::new(),
            pending: None,
            refinements_used: 0,
        }
    }
}

/// Terminal and pause states of one agent invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome {
    /// The agent recommended options and needs a human decision
    Paused {
        recommendations: Vec<ResultRecord>,
        summary: String,
        #[serde(skip)]
        session: AgentSession,
    },
    /// A selection was made; `selection` is None when the chosen id was
    /// never in the result set
    Finalized {
        selection: Option<ResultRecord>,
        summary: String,
    },
    /// The turn budget ran out with results on hand
    Incomplete {
        shortlist: Vec<ResultRecord>,
        summary: String,
    },
    /// The turn budget ran out with nothing found
    NoResults { summary: String },
}

/// What a specialty's tool handler tells the loop to do next.
pub enum ToolOutcome {
    /// Serialize this payload back to the model and keep looping
    Feedback(Value),
    /// Surface a recommendation and pause for the human
    Pause(Recommendation),
    /// The model confirmed a final selection
    Finalize { id: String, confirmation: String },
}

/// Per-domain behavior: prompts, tool declarations, tool execution.
#[async_trait]
pub trait Specialty: Send + Sync {
    fn name(&self) -> &'static str;

    fn system_prompt(&self) -> String;

    fn opening_prompt(&self, request: &SearchRequest) -> String;

    fn tool_definitions(&self) -> Vec<ToolDefinition>;

    async fn handle_tool(
        &self,
        call: &ToolCall,
        session: &mut AgentSession,
    ) -> Result<ToolOutcome, ToolFault>;
}

// Argument shapes shared by every specialty's analysis toolkit.

/// Arguments for AnalyzeAndFilter.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalyzeArgs {
    /// Ranking goal, e.g. highest_rated, best_value, closest_to_proximity_location
    #[serde(default)]
    pub analysis_goal: Option<String>,
    /// How many top results to keep in the shortlist
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// Arguments for ReflectAndModifySearch.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReflectArgs {
    /// Why the current results are unsatisfying and what to change
    pub reasoning: String,
}

/// Arguments for ProvideRecommendation.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RecommendArgs {
    /// Ids of the recommended results, best first
    pub top_ids: Vec<String>,
    pub reasoning: String,
    /// One-paragraph summary to show the user
    pub summary: String,
}

/// Arguments for FinalizeSelection.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FinalizeArgs {
    pub selected_id: String,
    pub confirmation_message: String,
}

/// Deserialization failures become recoverable faults the model can fix.
pub(crate) fn invalid_args(err: serde_json::Error) -> ToolFault {
    ToolFault::InvalidArguments(err.to_string())
}

pub struct SpecialistAgent {
    specialty: Arc<dyn Specialty>,
    llm: Arc<dyn LlmProvider>,
    limits: TurnLimits,
}

impl SpecialistAgent {
    pub fn new(specialty: Arc<dyn Specialty>, llm: Arc<dyn LlmProvider>, limits: TurnLimits) -> Self {
        Self {
            specialty,
            llm,
            limits,
        }
    }

    pub fn domain(&self) -> &'static str {
        self.specialty.name()
    }

    /// Start a fresh invocation for this request.
    pub async fn begin(&self, request: SearchRequest) -> AgentResult<AgentOutcome> {
        info!(agent = self.specialty.name(), "starting agent invocation");
        let history = vec![
            Message::system(self.specialty.system_prompt()),
            Message::user(self.specialty.opening_prompt(&request)),
        ];
        let session = AgentSession::new(request, history);
        self.drive(session).await
    }

    /// Resume a paused invocation with the human's decision.
    pub async fn resume(
        &self,
        mut session: AgentSession,
        decision: &UserDecision,
    ) -> AgentResult<AgentOutcome> {
        match decision {
            UserDecision::FinalChoice { id } => {
                // Direct lookup; no model round trip needed to honor a choice
                let selection = session.results.get(id).cloned();
                let summary = match &selection {
                    Some(record) => format!("Selection confirmed: {}.", record.name),
                    None => {
                        warn!(
                            agent = self.specialty.name(),
                            id = %id,
                            "final choice id not present in result set"
                        );
                        format!("The selected option '{id}' was not among the search results.")
                    }
                };
                Ok(AgentOutcome::Finalized { selection, summary })
            }
            UserDecision::Refine { .. } => {
                if session.refinements_used >= self.limits.max_refinements {
                    // Budget spent; re-present the standing recommendation and
                    // keep the session alive so a final choice is still possible
                    warn!(
                        agent = self.specialty.name(),
                        used = session.refinements_used,
                        "refinement budget exhausted"
                    );
                    let recommendations = self.shortlist_records(&session);
                    return Ok(AgentOutcome::Paused {
                        recommendations,
                        summary: "The refinement limit has been reached; please choose \
                                  from the current recommendations."
                            .to_string(),
                        session,
                    });
                }
                session.refinements_used += 1;
                session.pending = None;
                let text = ContinuationMessage::new(decision, &session.request).render();
                session.history.push(Message::user(text));
                self.drive(session).await
            }
        }
    }

    async fn drive(&self, mut session: AgentSession) -> AgentResult<AgentOutcome> {
        let tools = self.specialty.tool_definitions();

        for turn in 0..self.limits.max_turns {
            let reply = self.llm.converse(&session.history, &tools).await?;

            if reply.tool_calls.is_empty() {
                warn!(
                    agent = self.specialty.name(),
                    turn, "model replied with prose instead of a tool call"
                );
                session.history.push(Message::assistant(reply.text));
                break;
            }

            session
                .history
                .push(Message::assistant_with_tools(reply.text, reply.tool_calls.clone()));

            for call in &reply.tool_calls {
                match self.specialty.handle_tool(call, &mut session).await {
                    Ok(ToolOutcome::Feedback(payload)) => {
                        session
                            .history
                            .push(Message::tool_result(&call.id, &call.name, &payload));
                    }
                    Ok(ToolOutcome::Pause(recommendation)) => {
                        session.shortlist = recommendation.ids.clone();
                        let recommendations = self.shortlist_records_for(&session, &recommendation.ids);
                        let summary = recommendation.summary.clone();
                        session.pending = Some(recommendation);
                        // Every functionCall needs a matching functionResponse
                        // in the stored history, or the next converse on a
                        // resumed session is rejected by the model API
                        let ack = json!({ "success": true, "status": "paused_for_user" });
                        session
                            .history
                            .push(Message::tool_result(&call.id, &call.name, &ack));
                        info!(
                            agent = self.specialty.name(),
                            count = recommendations.len(),
                            "pausing for human input"
                        );
                        return Ok(AgentOutcome::Paused {
                            recommendations,
                            summary,
                            session,
                        });
                    }
                    Ok(ToolOutcome::Finalize { id, confirmation }) => {
                        let selection = session.results.get(&id).cloned();
                        if selection.is_none() {
                            warn!(
                                agent = self.specialty.name(),
                                id = %id,
                                "finalized id not present in result set"
                            );
                        }
                        return Ok(AgentOutcome::Finalized {
                            selection,
                            summary: confirmation,
                        });
                    }
                    Err(fault) => {
                        warn!(
                            agent = self.specialty.name(),
                            tool = %call.name,
                            error = %fault,
                            "tool fault, feeding correction back to the model"
                        );
                        let payload = json!({
                            "success": false,
                            "error": fault.to_string(),
                            "hint": fault.hint(),
                        });
                        session
                            .history
                            .push(Message::tool_result(&call.id, &call.name, &payload));
                    }
                }
            }
        }

        if session.results.is_empty() {
            Ok(AgentOutcome::NoResults {
                summary: format!(
                    "No {} results were found within the allotted search turns.",
                    session.request.domain_name()
                ),
            })
        } else {
            let shortlist = self.shortlist_records(&session);
            Ok(AgentOutcome::Incomplete {
                shortlist,
                summary: format!(
                    "The {} search ran out of turns before a recommendation was made; \
                     here are the leading options found so far.",
                    session.request.domain_name()
                ),
            })
        }
    }

    fn shortlist_records(&self, session: &AgentSession) -> Vec<ResultRecord> {
        if session.shortlist.is_empty() {
            session.results.top(3)
        } else {
            self.shortlist_records_for(session, &session.shortlist)
        }
    }

    fn shortlist_records_for(&self, session: &AgentSession, ids: &[String]) -> Vec<ResultRecord> {
        // Unknown ids are dropped silently; the model sometimes invents them
        ids.iter()
            .filter_map(|id| session.results.get(id).cloned())
            .collect()
    }
}
