//! Kitsune Authr Library
//!
//! Stateless username/password authentication backend with signed session tokens.
//!
//! # Features
//!
//! - **Stateless Sessions**: HS256-signed JWTs, no server-side session store
//! - **Pluggable Collaborators**: user directory and password verification
//!   behind traits, injected at startup
//! - **Anonymous-Tolerant Gate**: token failures degrade requests to
//!   anonymous; route policy decides rejection
//! - **Config-Driven**: YAML configuration with environment expansion
//!
//! # Example
//!
//! ```no_run
//! use kitsune_authr::{config::Config, server::Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut server = Server::new(config)?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod directory;
pub mod metrics;
pub mod router;
pub mod server;
pub mod token;

// Re-export commonly used types
pub use config::Config;
pub use server::Server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
