//! Client for the declarative video render service.
//!
//! The renderer consumes a named composition plus an input-properties
//! object and produces an mp4. Composition metadata is resolved once per
//! process and cached; audio URLs are validated reachable before every
//! render because the renderer's own failure mode for unreachable media is
//! a hang rather than a clean error.

mod client;
mod config;
mod error;
mod types;

pub use client::RenderClient;
pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use types::{CompositionInfo, CompositionProps};
