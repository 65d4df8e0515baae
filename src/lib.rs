//! Async client for the vidshare video-sharing backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `net` talks to the REST API (wire types, the `Backend` seam, the `reqwest`
//! implementation and per-resource clients). `state` holds everything the
//! views derive from it: the auth session, persisted storage, the per-video
//! interaction driver, the comment tree and the feed paginator. `util` has
//! the display helpers. The `vidshare` binary composes these into a terminal
//! front end.

pub mod config;
pub mod error;
pub mod net;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
