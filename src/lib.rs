//! # Calypso - Multi-Agent Vacation Planner
//!
//! Calypso plans a trip with a team of LLM-driven specialist agents
//! coordinated by a central orchestrator:
//!
//! - **Phase 1** (human in the loop): the flight agent and then the hotel
//!   agent each search, recommend, and pause for the user's decision.
//! - **Phase 2** (automatic): restaurant and attraction agents search
//!   around the chosen hotel, and the itinerary agent assembles a
//!   day-by-day plan.
//!
//! Each specialist wraps a bounded tool-calling loop around a travel
//! provider; pause/resume state travels as a serializable session value.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use calypso::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let settings = Settings::new()?;
//!
//!     // Server will start on configured host:port
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod agents;
pub mod cli;
pub mod config;
pub mod domain;
pub mod orchestrator;
pub mod providers;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::adapters::api_handler::{self, ApiState};

/// Creates the Axum application router with all endpoints configured.
pub fn create_app(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api_handler::health))
        .route("/api/orchestrate", post(api_handler::orchestrate))
        .route("/api/resume", post(api_handler::resume))
        .route("/api/agents/:name/search", post(api_handler::debug_agent))
        .with_state(state)
        .layer(cors)
}
