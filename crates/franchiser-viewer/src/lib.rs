//! Franchiser delegation explorer.
//!
//! [`Explorer`] is the service object shared by every front end: it owns
//! the fetcher and the name cache, tracks the current owner/delegatee pair
//! and exposes the tree, the selection and display names. The binary wraps
//! it in an interactive console or prints a one-shot report.

pub mod config;
pub mod console;
pub mod demo;
pub mod explorer;
pub mod logging;
pub mod print;

pub use config::{ConfigError, ViewerConfig};
pub use explorer::{Explorer, TreeSnapshot, TreeStatus};
pub use logging::{init_logging, LogFormat, LogTarget};
