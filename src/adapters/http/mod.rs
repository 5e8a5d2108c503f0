//! HTTP ingress - channel webhook, health, and backend callback endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::app_router;
