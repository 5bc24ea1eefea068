use axum::{
    routing::{get, post},
    Router,
};
use records_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::in_flight,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    // Each heavy endpoint gets its own single-flight guard so a running seed
    // never blocks a flag reset.
    let seed_api = Router::new()
        .route("/user/seed", post(routes::user::seed_users))
        .layer(axum::middleware::from_fn_with_state(
            in_flight::new_guard_state(1),
            in_flight::in_flight_middleware,
        ));

    let reset_api = Router::new()
        .route("/user/reset-problems", post(routes::user::reset_problems))
        .layer(axum::middleware::from_fn_with_state(
            in_flight::new_guard_state(1),
            in_flight::in_flight_middleware,
        ));

    let app = base_routes
        .merge(seed_api)
        .merge(reset_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
