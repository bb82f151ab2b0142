// Library crate: main.rs and the integration tests share these modules

pub mod capture;
pub mod config;
pub mod counters;
pub mod engine;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod rotator;
pub mod routes;
pub mod supervisor;
pub mod version;
