//! Central configuration constants for endpoints, queue sizes and defaults.

/// Default base URL of the management API.
pub const DEFAULT_API_URL: &str = "http://localhost:1080";

/// Default base URL for streaming (WebSocket) connections.
pub const DEFAULT_WS_URL: &str = "ws://localhost:1080/ws";

/// Capacity of the queue between a streaming connection and its reader.
pub const FRAME_QUEUE_CAPACITY: usize = 100;

/// Capacity of the outbound command queue of the bus writer.
pub const BUS_COMMAND_CAPACITY: usize = 32;

/// Authorization scheme used for the stored token.
pub const AUTH_SCHEME: &str = "Basic";

/// Authorization scheme of a token obtained through GitHub OAuth.
pub const GITHUB_AUTH_SCHEME: &str = "GitHub";

/// Environment variables read by the CLI.
pub const ENV_API_URL: &str = "DECKHAND_API_URL";
pub const ENV_WS_URL: &str = "DECKHAND_WS_URL";
pub const ENV_USER: &str = "DECKHAND_USER";
pub const ENV_PASSWORD: &str = "DECKHAND_PASSWORD";

/// Route paths understood by the console.
pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
