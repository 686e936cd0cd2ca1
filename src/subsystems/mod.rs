mod catalog_listener;
mod web_server;

pub use catalog_listener::CatalogListener;
pub use web_server::{WebServer, health_check_endpoint, router};
