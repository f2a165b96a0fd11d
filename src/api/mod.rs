//! API layer - HTTP endpoint handlers.

mod health;
mod mail;
mod routes;

pub use health::{health, HealthResponse};
pub use mail::{render, send, RenderResponse, SendResponse};
pub use routes::api_routes;
