pub mod common;
pub mod config;
pub mod graphql;
pub mod idempotency;
pub mod logging;
pub mod observability;
pub mod server;
pub mod storage;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

// Domain data shapes shared across layers
pub mod domain;
