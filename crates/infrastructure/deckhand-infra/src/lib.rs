pub mod auth;
pub mod config;
pub mod error;
pub mod net;

// Re-exports for convenience
pub use auth::{basic_token, TokenStore};
pub use config::ClientConfig;
pub use error::ClientError;
pub use net::stream::{StreamEvent, StreamSession};
pub use net::DockerClient;
