pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::{problem_service::ProblemService, seed_service::SeedService};
use sqlx::PgPool;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub seed_service: SeedService,
    pub problem_service: ProblemService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let seed_service = SeedService::new(pool.clone())
            .with_batch_size(config.seed_batch_size)
            .with_workers(config.seed_workers)
            .with_timeout(config.seed_timeout_secs.map(Duration::from_secs));
        let problem_service = ProblemService::new(pool.clone());

        Self {
            pool,
            seed_service,
            problem_service,
        }
    }
}
