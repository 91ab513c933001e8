//! # Watchbell Core
//!
//! Shared vocabulary for the Watchbell daemon: the artifact and subscriber
//! types, the narrow traits every external collaborator is reached through,
//! the configuration tree and the error taxonomy.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::WatchbellConfig;
pub use error::{Result, WatchbellError};
pub use types::{Artifact, IncomingMessage, SubscriberId};
