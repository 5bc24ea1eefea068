use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

fn json_request(uri: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder().method("POST").uri(uri);
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn count_users(pool: &sqlx::PgPool, predicate: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {}", predicate))
        .fetch_one(pool)
        .await
        .expect("count query")
}

#[tokio::test]
async fn seed_and_reset_flow_end_to_end() {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("SEED_BATCH_SIZE", "4");
    env::set_var("SEED_WORKERS", "2");

    records_backend::config::init_config().expect("init config");
    let pool = records_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    // Clean slate so the counts below are exact.
    sqlx::query("TRUNCATE TABLE users RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("truncate");

    let app_state = records_backend::AppState::new(pool.clone());
    let app = Router::new()
        .route("/user/seed", post(records_backend::routes::user::seed_users))
        .route(
            "/user/reset-problems",
            post(records_backend::routes::user::reset_problems),
        )
        .with_state(app_state);

    // A negative total is rejected before any work happens.
    let resp = app
        .clone()
        .oneshot(json_request("/user/seed", Some(json!({ "total": -5 }))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_users(&pool, "TRUE").await, 0);

    // Seed ten users with a fixed rng seed.
    let resp = app
        .clone()
        .oneshot(json_request(
            "/user/seed",
            Some(json!({ "total": 10, "seed": 42 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = response_json(resp).await;
    assert_eq!(body["requested"], 10);
    assert_eq!(body["inserted"], 10);
    assert_eq!(body["cancelled"], false);

    assert_eq!(count_users(&pool, "TRUE").await, 10);
    // Even indexes 0,2,4,6,8 are Male.
    assert_eq!(count_users(&pool, "gender = 'Male'").await, 5);
    assert_eq!(count_users(&pool, "gender = 'Female'").await, 5);
    assert_eq!(count_users(&pool, "age < 0 OR age > 99").await, 0);
    // Names concatenate the generation index.
    assert_eq!(
        count_users(&pool, "first_name LIKE 'FirstName%' AND last_name LIKE 'LastName%'").await,
        10
    );
    assert_eq!(
        count_users(
            &pool,
            "first_name = 'FirstName0' AND last_name = 'LastName0' AND gender = 'Male'"
        )
        .await,
        1
    );
    assert_eq!(
        count_users(&pool, "first_name = 'FirstName9' AND gender = 'Female'").await,
        1
    );

    let flagged = count_users(&pool, "has_problems").await;

    // Reset reports exactly the flagged rows it flipped.
    let resp = app
        .clone()
        .oneshot(json_request("/user/reset-problems", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = response_json(resp).await;
    assert_eq!(body["usersWithProblems"], flagged);
    assert_eq!(count_users(&pool, "has_problems").await, 0);

    // A second reset with no intervening writer is a no-op.
    let resp = app
        .clone()
        .oneshot(json_request("/user/reset-problems", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = response_json(resp).await;
    assert_eq!(body["usersWithProblems"], 0);
    assert_eq!(count_users(&pool, "has_problems").await, 0);

    // Seeding again appends; it never mutates or deletes existing rows.
    let resp = app
        .clone()
        .oneshot(json_request(
            "/user/seed",
            Some(json!({ "total": 6, "seed": 7 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(count_users(&pool, "TRUE").await, 16);
}
