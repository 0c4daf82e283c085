use serde::{Deserialize, Serialize};

use super::request::SearchRequest;

/// The two ways a human can answer a paused recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserDecision {
    /// Free-text feedback that re-enters the search loop
    Refine { feedback: String },
    /// Pick one of the recommended results by id
    FinalChoice { id: String },
}

/// Builds the user-role message that resumes a paused conversation.
/// The original request is always restated first so a refinement turn
/// cannot drift to a different city or date range.
#[derive(Debug, Clone)]
pub struct ContinuationMessage<'a> {
    pub decision: &'a UserDecision,
    pub request: &'a SearchRequest,
}

impl ContinuationMessage<'_> {
    pub fn new<'a>(
        decision: &'a UserDecision,
        request: &'a SearchRequest,
    ) -> ContinuationMessage<'a> {
        ContinuationMessage { decision, request }
    }

    pub fn render(&self) -> String {
        let context = self.request.restate();
        match self.decision {
            UserDecision::Refine { feedback } => format!(
                "{context}\n\nThe user reviewed your recommendation and asked for a refinement: \
                 {feedback}\n\nAdjust the search accordingly, but maintain the original search \
                 location and dates."
            ),
            UserDecision::FinalChoice { id } => format!(
                "{context}\n\nFINAL_CHOICE_TRIGGER: The user has selected option '{id}'. \
                 Call FinalizeSelection with this id now."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::{FlightQuery, SearchRequest};

    fn request() -> SearchRequest {
        SearchRequest::Flight(FlightQuery {
            origin: "SFO".into(),
            destination: "NRT".into(),
            departure_date: "2026-10-01".into(),
            return_date: None,
            passengers: 1,
        })
    }

    #[test]
    fn refine_preserves_restated_context() {
        let request = request();
        let decision = UserDecision::Refine {
            feedback: "cheaper options please".into(),
        };
        let rendered = ContinuationMessage::new(&decision, &request).render();
        assert!(rendered.starts_with(&request.restate()));
        assert!(rendered.contains("cheaper options please"));
        assert!(rendered.contains("maintain the original search location and dates"));
    }

    #[test]
    fn final_choice_carries_trigger_and_id() {
        let request = request();
        let decision = UserDecision::FinalChoice { id: "FL001".into() };
        let rendered = ContinuationMessage::new(&decision, &request).render();
        assert!(rendered.starts_with(&request.restate()));
        assert!(rendered.contains("FINAL_CHOICE_TRIGGER"));
        assert!(rendered.contains("'FL001'"));
    }
}
