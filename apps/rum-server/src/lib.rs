//! RUM server: field INP ingestion, live feed and on-demand lab analysis
//!
//! Provides:
//! - `POST /rum` to store a field sample and fan it out
//! - `GET /rum-data` for stored samples, optionally by page URL
//! - `GET /rum-stream` as a Server-Sent Events feed
//! - `GET /analyze?url=` for a synthetic lab report
//! - `GET /health`

pub mod broadcast;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use routes::build_router;
pub use state::AppState;
