pub mod config;
pub mod logging;
pub mod routes;

pub use config::{Config, get_configuration};
pub use routes::build_router;
