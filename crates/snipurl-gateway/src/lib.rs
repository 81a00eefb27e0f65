//! HTTP transport for SnipURL.

pub mod app;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod owner;
pub mod state;

pub use app::App;
pub use state::AppState;
