//! API route handlers

pub mod health;
pub mod otlp_collector;
pub mod stats;
