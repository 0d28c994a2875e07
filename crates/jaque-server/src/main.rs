use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use jaque_api::users::{self, AppState, AppStateInner};
use jaque_api::{export, import, moves};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jaque=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("JAQUE_DB_PATH").unwrap_or_else(|_| "jaque.db".into());
    let host = std::env::var("JAQUE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("JAQUE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = jaque_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db });

    // Routes
    let user_routes = Router::new()
        .route("/users/registro", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/perfil/{username}", get(users::profile_by_username))
        .route("/users/email/{email}", get(users::profile_by_email))
        .route("/users/existe/usuario/{username}", get(users::username_exists))
        .route("/users/existe/email/{email}", get(users::email_exists))
        .route("/users/{id}", get(users::profile_by_id).put(users::update_profile));

    let move_routes = Router::new()
        .route("/moves", get(moves::list_all).post(moves::create))
        .route("/moves/user/{user_id}", get(moves::list_by_user))
        .route("/moves/player/{name}", get(moves::list_by_player))
        .route("/moves/export/csv", get(export::export_csv))
        .route("/moves/import/csv", post(import::preview_csv))
        .route("/moves/import/confirm", post(import::confirm_import))
        .route(
            "/moves/{id}",
            get(moves::get_by_id).put(moves::update).delete(moves::delete),
        );

    let app = Router::new()
        .merge(user_routes)
        .merge(move_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Jaque server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
