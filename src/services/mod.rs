pub mod generator;
pub mod problem_service;
pub mod seed_service;
