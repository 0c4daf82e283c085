//! In-memory store for paused orchestrations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::TripParams;
use crate::agents::specialist::AgentSession;
use crate::domain::ResultRecord;

/// Which HIL stage the stored agent session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Flight,
    Hotel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripSelections {
    pub flight: Option<ResultRecord>,
    pub hotel: Option<ResultRecord>,
}

/// One paused orchestration, keyed by its public session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationSession {
    pub trip: TripParams,
    pub phase: Phase,
    pub paused: AgentSession,
    pub selections: TripSelections,
}

/// Sessions live only in this process. A resume removes its entry and
/// re-inserts only if the run pauses again, so each session has a single
/// writer; concurrent resumes of the same id are undefined.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, OrchestrationSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session under a fresh uuid and return the id.
    pub async fn create(&self, session: OrchestrationSession) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    /// Store a session under a caller-chosen id, reusing it across pauses.
    pub async fn insert(&self, id: String, session: OrchestrationSession) {
        self.sessions.write().await.insert(id, session);
    }

    pub async fn remove(&self, id: &str) -> Option<OrchestrationSession> {
        self.sessions.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FlightQuery, SearchRequest};

    fn session() -> OrchestrationSession {
        let request = SearchRequest::Flight(FlightQuery {
            origin: "JFK".into(),
            destination: "MAD".into(),
            departure_date: "2026-09-10".into(),
            return_date: None,
            passengers: 1,
        });
        OrchestrationSession {
            trip: TripParams {
                origin: "JFK".into(),
                destination: "MAD".into(),
                destination_city: "Madrid".into(),
                departure_date: "2026-09-10".into(),
                return_date: None,
                travelers: 1,
            },
            phase: Phase::Flight,
            paused: crate::agents::specialist::AgentSession {
                request,
                results: Default::default(),
                history: Vec::new(),
                shortlist: Vec::new(),
                pending: None,
                refinements_used: 0,
            },
            selections: TripSelections::default(),
        }
    }

    #[tokio::test]
    async fn create_remove_round_trip() {
        let store = SessionStore::new();
        let id = store.create(session()).await;
        assert_eq!(store.len().await, 1);
        let removed = store.remove(&id).await.unwrap();
        assert_eq!(removed.phase, Phase::Flight);
        assert!(store.remove(&id).await.is_none());
        assert!(store.is_empty().await);
    }
}
