mod config;
mod dispatch;
pub mod errors;
mod handler;
pub mod messages;
mod reply;
mod routes;
mod version;

pub use config::*;
pub use dispatch::*;
pub use handler::*;
pub use reply::*;
pub use routes::*;
pub use version::*;
