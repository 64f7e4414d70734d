pub mod app;
pub mod authz;
pub mod db;
pub mod docs;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod extract;
pub mod identity;
pub mod jwt;
pub mod locale;
pub mod models;
pub mod routes;
pub mod services;
pub mod settings;
pub mod stores;
pub mod utils;

// Re-export commonly used items for tests
pub use app::{create_app, router, AppState};
