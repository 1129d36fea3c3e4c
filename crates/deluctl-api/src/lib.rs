// deluctl-api: Async Rust client for the Deluge web UI's JSON-RPC endpoint

pub mod client;
pub mod error;
pub mod methods;
pub mod models;
pub mod rpc;
pub mod transport;

pub use client::DelugeClient;
pub use error::Error;
pub use models::{SessionStatus, SpeedLimits, TorrentStatus};
pub use transport::TransportConfig;
