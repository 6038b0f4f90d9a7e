use axum::http::HeaderValue;
use axum::Router;
use roadtale::cache::MemoryCache;
use roadtale::config::Config;
use roadtale::constants::RADIUS_STEPS_METERS;
use roadtale::exposure::ExposureLog;
use roadtale::history::HistoryStore;
use roadtale::llm::OpenAiClient;
use roadtale::providers::{OverpassProvider, PlacesProvider, PoiProvider, WikidataProvider};
use roadtale::services::{CandidateSelector, FactService, PoiService, WikipediaClient};
use roadtale::story::{Narrator, StoryValidator};
use roadtale::taste::TasteStore;
use roadtale::tts::OpenAiSpeech;
use roadtale::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadtale=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting roadtale server");

    // Optional durable store: absence degrades to memory-only operation
    let pool = match config.database_url {
        Some(ref database_url) => {
            tracing::info!("Connecting to database...");
            match roadtale::db::create_pool(database_url).await {
                Ok(pool) => {
                    tracing::info!("Running database migrations...");
                    sqlx::migrate!("./migrations").run(&pool).await?;
                    tracing::info!("Database ready");
                    Some(pool)
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to connect to database: {}. Continuing memory-only.",
                        e
                    );
                    None
                }
            }
        }
        None => {
            tracing::warn!("DATABASE_URL not set. History and caches are memory-only.");
            None
        }
    };

    let http_timeout = Duration::from_millis(config.http_timeout_ms);
    let llm_timeout = Duration::from_millis(config.llm_timeout_ms);

    let cache = Arc::new(MemoryCache::new(
        Duration::from_millis(config.geo_cache_ttl_ms),
        Duration::from_millis(config.fact_cache_ttl_ms),
    ));

    // Providers, in deterministic merge order: OSM before the graph
    let wikidata = Arc::new(WikidataProvider::new(
        config.osm_user_agent.clone(),
        http_timeout,
    ));
    let providers: Vec<Arc<dyn PoiProvider>> = vec![
        Arc::new(OverpassProvider::new(
            config.overpass_base_url.clone(),
            config.osm_user_agent.clone(),
            http_timeout,
        )),
        wikidata.clone(),
    ];
    let fallback: Option<Arc<dyn PoiProvider>> = match config.google_places_api_key {
        Some(ref key) => Some(Arc::new(PlacesProvider::new(key.clone(), http_timeout))),
        None => {
            tracing::info!("GOOGLE_PLACES_API_KEY not set; running without the places fallback");
            None
        }
    };

    let poi_service = Arc::new(PoiService::new(
        providers,
        fallback,
        cache.clone(),
        pool.clone(),
        Duration::from_millis(config.geo_cache_ttl_ms),
    ));

    let llm = Arc::new(OpenAiClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        llm_timeout,
    ));
    let tts = Arc::new(OpenAiSpeech::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.openai_tts_model.clone(),
        config.openai_tts_voice.clone(),
        llm_timeout,
    ));

    let wikipedia = Arc::new(WikipediaClient::new(
        config.osm_user_agent.clone(),
        http_timeout,
    ));
    let fact_service = Arc::new(FactService::new(
        wikidata,
        wikipedia,
        llm.clone(),
        cache,
        config.extra_sensitive.clone(),
    ));
    let selector = Arc::new(
        CandidateSelector::new(fact_service, config.max_candidates)
            .with_score_ceiling(config.min_poi_score_to_speak),
    );

    let history = Arc::new(HistoryStore::new(pool.clone()));
    let exposure = Arc::new(ExposureLog::new(pool.clone()));
    let validator = StoryValidator::new(
        config.min_story_words,
        config.max_story_words,
        config.extra_filler.clone(),
    );

    // POI_RADIUS_METERS caps the ladder; an over-tight cap still leaves
    // one rung so the search can run at all
    let mut radius_steps: Vec<f64> = match config.poi_radius_meters {
        Some(cap) => RADIUS_STEPS_METERS
            .iter()
            .copied()
            .filter(|r| *r <= cap)
            .collect(),
        None => RADIUS_STEPS_METERS.to_vec(),
    };
    if radius_steps.is_empty() {
        radius_steps.push(RADIUS_STEPS_METERS[0]);
    }

    let narrator = Narrator::new(
        poi_service,
        selector,
        llm,
        tts,
        history,
        exposure,
        validator,
        radius_steps,
        config.min_story_words,
        config.max_story_words,
        config.display_distance_step_m,
    );

    let state = Arc::new(AppState {
        narrator,
        tastes: TasteStore::new(pool),
    });

    // CORS: explicit origin list when configured, open otherwise
    let cors = match config.cors_allow_origins {
        Some(ref origins) => {
            let list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(list))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app: Router = roadtale::routes::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
