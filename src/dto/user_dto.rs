use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SeedPayload {
    /// Rows to insert; defaults to the operational constant of one million.
    #[validate(range(min = 0))]
    pub total: Option<i64>,
    /// Fixed rng seed for reproducible runs.
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedResponse {
    pub message: String,
    pub requested: i64,
    pub inserted: i64,
    pub batches: u32,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetProblemsResponse {
    pub message: String,
    #[serde(rename = "usersWithProblems")]
    pub users_with_problems: i64,
}
