//! Local dev runtime: serve an edge handler over real HTTP for testing.

mod config;
mod server;

pub use config::DevConfig;
pub use server::DevServer;
