pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod graphql;
pub mod infra;
pub mod logging;
pub mod metrics;
pub mod schedule;
pub mod server;

pub use error::{CrmError, Result};
