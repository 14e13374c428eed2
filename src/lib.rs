//! Unofficial Rust client for Intrinio's real-time equities and options
//! streaming feeds.
//!
//! Authenticates against the vendor's HTTP auth endpoint, maintains a
//! WebSocket connection with automatic reconnect, decodes the binary
//! trade/quote/refresh/unusual-activity framing, and dispatches typed
//! events to user callbacks through a bounded queue with a worker pool.
//! Also supports replaying historical capture files through the same
//! event path.
//!
//! ```no_run
//! use std::sync::Arc;
//! use intrinio_realtime_rs::{Client, Config, Provider};
//!
//! # async fn run() -> intrinio_realtime_rs::Result<()> {
//! let config = Config::new("api-key", Provider::REALTIME);
//! let client = Client::new(config, Arc::new(|event| {
//!     println!("{event:?}");
//! }))?;
//! client.join("AAPL").await;
//! client.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod backoff;
pub mod client;
pub mod config;
pub mod connection;
pub mod constants;
pub mod decode;
pub mod error;
pub mod provider;
pub mod queue;
pub mod registry;
pub mod replay;
pub mod types;

pub use client::Client;
pub use config::Config;
pub use connection::State as ConnectionState;
pub use error::{IntrinioError, Result};
pub use provider::ProviderProfile;
pub use registry::Registry;
pub use replay::{ReplayConfig, ReplayEngine};
pub use types::{Channel, Event, Provider, Stats, Subprovider};
