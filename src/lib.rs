//! # conduit-mcp
//! A peer-neutral JSON-RPC 2.0 / Model Context Protocol engine
//!
//! Unlike a client/server split SDK, [`Engine`] plays both roles at once: it
//! multiplexes outbound requests awaiting a response and inbound requests
//! awaiting a handler over the same transport. Concrete transports, domain
//! schemas (tools/resources/prompts/sampling) and auth are out of scope —
//! this crate only ships the plumbing those layers are built on top of.
//!
//! ## Example
//!
//! ```no_run
//! use conduit_mcp::{Engine, EngineOptions};
//!
//! # #[cfg(any())]
//! # async fn run(transport: impl conduit_mcp::Transport + 'static) {
//! let engine = Engine::new(EngineOptions::new());
//! engine.connect(transport).await.unwrap();
//! # }
//! ```

pub use engine::{Engine, EngineOptions};
pub use error::{Error, ErrorCode};
pub use transport::Transport;

pub mod engine;
pub mod error;
pub mod types;
pub mod transport;
pub mod capabilities;
pub mod task;
pub mod progress;
pub mod debounce;
pub mod middleware;
pub mod validator;

pub(crate) mod commands;
pub(crate) mod shared;

pub(crate) const SDK_NAME: &str = "conduit-mcp";
pub(crate) const JSONRPC_VERSION: &str = "2.0";
