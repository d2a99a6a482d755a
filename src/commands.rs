//! Reserved JSON-RPC method names the engine special-cases

/// Handshake request every peer sends before anything else.
pub const INITIALIZE: &str = "initialize";

/// Notification a peer sends once it has processed the `initialize` response.
pub const INITIALIZED: &str = "notifications/initialized";

/// Liveness check, never capability-gated.
pub const PING: &str = "ping";
