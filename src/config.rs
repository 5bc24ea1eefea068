use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

// 5 binds per row; Postgres caps a single statement at 65535 bind parameters.
const MAX_SEED_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub seed_batch_size: usize,
    pub seed_workers: usize,
    pub seed_timeout_secs: Option<u64>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            db_max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", 50)?,
            seed_batch_size: get_env_parse_or("SEED_BATCH_SIZE", 1_000)?,
            seed_workers: get_env_parse_or("SEED_WORKERS", 4)?,
            seed_timeout_secs: match env::var("SEED_TIMEOUT_SECS") {
                Ok(raw) => Some(raw.parse().map_err(|e| {
                    Error::Config(format!("Invalid value for SEED_TIMEOUT_SECS: {}", e))
                })?),
                Err(_) => None,
            },
        };

        if config.db_max_connections == 0 {
            return Err(Error::Config(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if config.seed_batch_size == 0 || config.seed_batch_size > MAX_SEED_BATCH_SIZE {
            return Err(Error::Config(format!(
                "SEED_BATCH_SIZE must be between 1 and {}",
                MAX_SEED_BATCH_SIZE
            )));
        }
        if config.seed_workers == 0 {
            return Err(Error::Config("SEED_WORKERS must be at least 1".to_string()));
        }

        Ok(config)
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
