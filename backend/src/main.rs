use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use serde_json::json;
use shared::{Session, UserProfile};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

use volunteer_hub_backend::rest::{self, AppState};
use volunteer_hub_backend::storage::{MemoryStore, TracingNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let port: u16 = std::env::var("VHUB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    info!("Seeding in-memory document store");
    let store = Arc::new(MemoryStore::new());
    seed_demo_data(&store);

    let session = Session::Authenticated(UserProfile {
        uid: "service".to_string(),
        display_name: "Service account".to_string(),
    });
    let state = Arc::new(AppState::new(
        store.clone(),
        store,
        Arc::new(TracingNotifier),
        session,
    ));

    // CORS setup to allow the frontend dev server to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new().nest("/api", rest::router(state)).layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// A handful of records so the API has something to serve out of the box.
fn seed_demo_data(store: &MemoryStore) {
    store.insert_document(
        "beneficiaries",
        json!({
            "id": format!("beneficiary::{}", uuid::Uuid::new_v4()),
            "first_name": "Ana",
            "last_name": "Reyes",
            "birthdate": "2015-06-15",
            "accreditation_id": 12,
            "phone": "+63 900 000 0001",
            "photo_path": null,
            "expires_at": null
        }),
    );
    store.insert_document(
        "beneficiaries",
        json!({
            "id": format!("beneficiary::{}", uuid::Uuid::new_v4()),
            "first_name": "Ben",
            "last_name": "Cruz",
            "birthdate": "2017-02-03",
            "accreditation_id": null,
            "phone": null,
            "photo_path": null,
            "expires_at": "2026-09-20T00:00:00Z"
        }),
    );
    store.insert_document(
        "volunteers",
        json!({
            "id": format!("volunteer::{}", uuid::Uuid::new_v4()),
            "first_name": "Carla",
            "last_name": "Santos",
            "birthdate": "1998-11-30",
            "email": "carla@example.org",
            "phone": null,
            "photo_path": null,
            "expires_at": null
        }),
    );
    store.insert_document(
        "events",
        json!({
            "id": format!("event::{}", uuid::Uuid::new_v4()),
            "name": "River cleanup",
            "description": "Bring gloves",
            "location": "Pier 3",
            "starts_at": "2026-09-05T09:00:00Z",
            "ends_at": "2026-09-05T12:00:00Z",
            "expires_at": null
        }),
    );
}
