//! End-to-end orchestration: both HIL phases, Phase 2, and the HTTP surface.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use calypso::adapters::ApiState;
use calypso::agents::error::AgentError;
use calypso::agents::llm::{ModelTurn, ScriptedProvider};
use calypso::agents::specialist::{
    AttractionSpecialty, FlightSpecialty, HotelSpecialty, ItineraryAgent, RestaurantSpecialty,
    SpecialistAgent, TurnLimits,
};
use calypso::orchestrator::{OrchestrationResult, Orchestrator};
use calypso::providers::mock::{StaticFlightProvider, StaticHotelProvider, StaticPlaceProvider};
use calypso::domain::UserDecision;

fn orchestrator_with_script(turns: Vec<ModelTurn>) -> (Orchestrator, Arc<ScriptedProvider>) {
    let llm = Arc::new(ScriptedProvider::new(turns));
    let limits = TurnLimits::default();
    let place_provider = Arc::new(StaticPlaceProvider::new());
    let orchestrator = Orchestrator::new(
        llm.clone(),
        SpecialistAgent::new(
            Arc::new(FlightSpecialty::new(Arc::new(StaticFlightProvider::new()))),
            llm.clone(),
            limits,
        ),
        SpecialistAgent::new(
            Arc::new(HotelSpecialty::new(Arc::new(StaticHotelProvider::new()))),
            llm.clone(),
            limits,
        ),
        SpecialistAgent::new(
            Arc::new(RestaurantSpecialty::new(place_provider.clone())),
            llm.clone(),
            limits,
        ),
        SpecialistAgent::new(
            Arc::new(AttractionSpecialty::new(place_provider)),
            llm.clone(),
            limits,
        ),
        ItineraryAgent::new(llm.clone()),
        15,
    );
    (orchestrator, llm)
}

fn trip_args() -> Value {
    json!({
        "origin": "JFK",
        "destination": "MAD",
        "destination_city": "Madrid",
        "departure_date": "2026-09-10",
        "return_date": "2026-09-12",
        "travelers": 2
    })
}

fn recommend(ids: &[&str], summary: &str) -> ModelTurn {
    ModelTurn::tool(
        "ProvideRecommendation",
        json!({ "top_ids": ids, "reasoning": "strongest candidates", "summary": summary }),
    )
}

fn full_flow_script() -> Vec<ModelTurn> {
    vec![
        // Parser turn
        ModelTurn::tool("StartFlightSearch", trip_args()),
        // Flight agent
        ModelTurn::tool(
            "SearchFlights",
            json!({ "origin": "JFK", "destination": "MAD", "departure_date": "2026-09-10" }),
        ),
        recommend(&["FL001", "FL002"], "Two good flights."),
        // Hotel agent (after flight finalize)
        ModelTurn::tool(
            "SearchHotels",
            json!({ "city_code": "MAD", "check_in_date": "2026-09-10", "check_out_date": "2026-09-12" }),
        ),
        recommend(&["HT001", "HT003"], "Two good hotels."),
        // Phase 2: restaurants
        ModelTurn::tool("SearchRestaurants", json!({ "city": "Madrid" })),
        recommend(&["RS001", "RS002"], "Good food nearby."),
        // Phase 2: attractions
        ModelTurn::tool("SearchAttractions", json!({ "city": "Madrid" })),
        recommend(&["AT001", "AT002"], "Must-sees."),
        // Itinerary
        ModelTurn::text(
            "```json\n{\"days\": [{\"date\": \"2026-09-10\", \"morning\": \"Royal Palace\"}]}\n```",
        ),
    ]
}

#[tokio::test]
async fn full_trip_flow_completes_through_both_phases() {
    let (orchestrator, llm) = orchestrator_with_script(full_flow_script());

    // Phase 1a: flight pause
    let result = orchestrator
        .execute("Plan a trip from New York to Madrid, Sept 10-12, two of us", None)
        .await
        .unwrap();
    let flight_session = match result {
        OrchestrationResult::AwaitingUserInput {
            session_id,
            agent,
            recommendations,
            ..
        } => {
            assert_eq!(agent, "flight");
            assert_eq!(recommendations.len(), 2);
            session_id
        }
        other => panic!("expected flight pause, got {other:?}"),
    };

    // Phase 1b: pick the flight, hotel pauses next under the same id
    let result = orchestrator
        .resume(&flight_session, &UserDecision::FinalChoice { id: "FL001".into() })
        .await
        .unwrap();
    let hotel_session = match result {
        OrchestrationResult::AwaitingUserInput {
            session_id, agent, ..
        } => {
            assert_eq!(agent, "hotel");
            assert_eq!(session_id, flight_session);
            session_id
        }
        other => panic!("expected hotel pause, got {other:?}"),
    };

    // Phase 2 runs automatically after the hotel choice
    let result = orchestrator
        .resume(&hotel_session, &UserDecision::FinalChoice { id: "HT001".into() })
        .await
        .unwrap();
    match result {
        OrchestrationResult::Complete { plan, .. } => {
            assert_eq!(plan.flight.unwrap().id, "FL001");
            assert_eq!(plan.hotel.as_ref().unwrap().id, "HT001");
            assert!(!plan.restaurants.is_empty());
            assert!(!plan.attractions.is_empty());
            assert_eq!(plan.itinerary["days"][0]["date"], "2026-09-10");
        }
        other => panic!("expected complete, got {other:?}"),
    }

    // The session is gone once the plan is complete
    assert!(orchestrator.sessions().is_empty().await);

    // Phase 2 prompts were anchored to the chosen hotel
    let transcript = llm.transcript();
    let restaurant_opening = transcript
        .iter()
        .flat_map(|history| history.iter())
        .find(|m| m.content.contains("restaurants in Madrid"))
        .expect("restaurant prompt present");
    assert!(restaurant_opening.content.contains("Gran Via Palace"));
}

#[tokio::test]
async fn vague_prompt_yields_clarification() {
    let (orchestrator, _) = orchestrator_with_script(vec![ModelTurn::tool(
        "RequestClarification",
        json!({ "questions": ["Where are you flying from?", "What dates?"] }),
    )]);

    match orchestrator.execute("I want a vacation", None).await.unwrap() {
        OrchestrationResult::ClarificationNeeded { questions } => {
            assert_eq!(questions.len(), 2);
        }
        other => panic!("expected clarification, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_trip_parameters_degrade_to_clarification() {
    // Missing required fields in the parser's tool call must not surface
    // as a server error
    let (orchestrator, _) = orchestrator_with_script(vec![ModelTurn::tool(
        "StartFlightSearch",
        json!({ "origin": "JFK" }),
    )]);

    match orchestrator
        .execute("Fly me to Madrid", None)
        .await
        .unwrap()
    {
        OrchestrationResult::ClarificationNeeded { questions } => {
            assert!(!questions.is_empty());
        }
        other => panic!("expected clarification, got {other:?}"),
    }
}

#[tokio::test]
async fn one_way_trip_books_at_least_one_hotel_night() {
    let mut script = full_flow_script();
    // Same trip without a return date
    script[0] = ModelTurn::tool(
        "StartFlightSearch",
        json!({
            "origin": "JFK",
            "destination": "MAD",
            "destination_city": "Madrid",
            "departure_date": "2026-09-10",
            "travelers": 2
        }),
    );
    let (orchestrator, llm) = orchestrator_with_script(script);

    let result = orchestrator.execute("One way to Madrid", None).await.unwrap();
    let session_id = match result {
        OrchestrationResult::AwaitingUserInput { session_id, .. } => session_id,
        other => panic!("expected flight pause, got {other:?}"),
    };
    orchestrator
        .resume(&session_id, &UserDecision::FinalChoice { id: "FL001".into() })
        .await
        .unwrap();

    let transcript = llm.transcript();
    let hotel_opening = transcript
        .iter()
        .flat_map(|history| history.iter())
        .find(|m| m.content.contains("Find hotels in"))
        .expect("hotel prompt present");
    assert!(hotel_opening.content.contains("from 2026-09-10 to 2026-09-11"));
}

#[tokio::test]
async fn parser_prose_degrades_to_clarification() {
    let (orchestrator, _) =
        orchestrator_with_script(vec![ModelTurn::text("Sounds like a fun trip!")]);

    match orchestrator.execute("hello", None).await.unwrap() {
        OrchestrationResult::ClarificationNeeded { questions } => {
            assert_eq!(questions, vec!["Sounds like a fun trip!".to_string()]);
        }
        other => panic!("expected clarification, got {other:?}"),
    }
}

#[tokio::test]
async fn resume_of_unknown_session_is_an_error() {
    let (orchestrator, _) = orchestrator_with_script(vec![]);

    let err = orchestrator
        .resume("no-such-session", &UserDecision::FinalChoice { id: "X".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::SessionNotFound(_)));
}

#[tokio::test]
async fn http_health_and_unknown_session_status() {
    let (orchestrator, _) = orchestrator_with_script(vec![]);
    let app = calypso::create_app(ApiState {
        orchestrator: Arc::new(orchestrator),
    });

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({
        "session_id": "missing",
        "user_decision": { "type": "final_choice", "id": "FL001" }
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/resume")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let payload: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["success"], false);
    assert!(payload["error"].as_str().unwrap().contains("missing"));
}
