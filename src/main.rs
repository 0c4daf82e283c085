use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use calypso::adapters::ApiState;
use calypso::agents::llm::create_provider;
use calypso::agents::specialist::{
    AttractionSpecialty, FlightSpecialty, HotelSpecialty, ItineraryAgent, RestaurantSpecialty,
    SpecialistAgent, TurnLimits,
};
use calypso::cli::Cli;
use calypso::config::Settings;
use calypso::orchestrator::Orchestrator;
use calypso::providers::amadeus::AmadeusClient;
use calypso::providers::mock::{StaticFlightProvider, StaticHotelProvider, StaticPlaceProvider};
use calypso::providers::places::GooglePlacesClient;
use calypso::providers::{FlightProvider, HotelProvider, PlaceProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut settings = Settings::from_file(&cli.config)?;
    settings.apply_cli(&cli);
    let host = settings.server.host.clone();
    let port = settings.server.port;

    info!("Starting Calypso vacation planner on {}:{}", host, port);

    let llm = create_provider(&settings.llm)?;

    let amadeus = match (
        env::var(&settings.amadeus.api_key_env),
        env::var(&settings.amadeus.api_secret_env),
    ) {
        (Ok(key), Ok(secret)) => Some(Arc::new(AmadeusClient::new(
            settings.amadeus.base_url.clone(),
            key,
            secret,
        ))),
        _ => {
            warn!(
                "{} / {} not set, flight and hotel searches use built-in sample data",
                settings.amadeus.api_key_env, settings.amadeus.api_secret_env
            );
            None
        }
    };
    let (flight_provider, hotel_provider): (Arc<dyn FlightProvider>, Arc<dyn HotelProvider>) =
        match amadeus {
            Some(client) => (client.clone(), client),
            None => (
                Arc::new(StaticFlightProvider::new()),
                Arc::new(StaticHotelProvider::new()),
            ),
        };

    let place_provider: Arc<dyn PlaceProvider> = match env::var(&settings.places.api_key_env) {
        Ok(key) => Arc::new(GooglePlacesClient::new(
            settings.places.base_url.clone(),
            key,
        )),
        Err(_) => {
            warn!(
                "{} not set, restaurant and attraction searches use built-in sample data",
                settings.places.api_key_env
            );
            Arc::new(StaticPlaceProvider::new())
        }
    };

    let limits = TurnLimits {
        max_turns: settings.limits.max_turns,
        max_refinements: settings.limits.max_refinements,
    };
    let orchestrator = Orchestrator::new(
        llm.clone(),
        SpecialistAgent::new(
            Arc::new(FlightSpecialty::new(flight_provider)),
            llm.clone(),
            limits,
        ),
        SpecialistAgent::new(
            Arc::new(HotelSpecialty::new(hotel_provider)),
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
        ItineraryAgent::new(llm),
        settings.limits.phase2_results,
    );

    let app = calypso::create_app(ApiState {
        orchestrator: Arc::new(orchestrator),
    });

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
