//! Command-line and HTTP surface for qualstat: configuration, the file-backed
//! project store and the HTTP client for the numeric service.

pub mod config;
pub mod http_api;
pub mod listen;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use http_api::{router, AppState};
pub use service::HttpNumericService;
pub use store::{load_snapshot, FileProjectStore};
