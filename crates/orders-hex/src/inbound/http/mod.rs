mod auth;
mod server;

pub use auth::ADMIN_KEY_HEADER;
pub use server::{AppState, HttpServer, HttpServerConfig};
