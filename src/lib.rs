pub mod app;
pub mod config;
pub mod demo;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod preferences;
pub mod repository;
pub mod session;
pub mod state;
pub mod storage;
pub mod views;

pub use app::router;
pub use config::Config;
pub use errors::EmissionError;
pub use repository::Repository;
pub use state::AppState;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
