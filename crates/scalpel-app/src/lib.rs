#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]

//! Scalpel application bootstrap wiring.
//!
//! Layout: `config.rs` (layered `AppConfig`), `info.rs` (process/build info),
//! `lifecycle.rs` (`Service` trait and `Runner`), `banner.rs` (startup banner),
//! `http.rs` (health and metrics endpoints), `bootstrap.rs` (service wiring).

/// Startup banner service.
pub mod banner;
/// Application boot sequence.
pub mod bootstrap;
/// Layered application configuration.
pub mod config;
/// Application error types.
pub mod error;
/// Health and metrics HTTP service.
pub mod http;
/// Process and build information.
pub mod info;
/// Ordered service lifecycle.
pub mod lifecycle;

pub use bootstrap::run_app;
pub use config::{AppConfig, ConfigSources, HttpConfig, load_config};
pub use error::{AppError, AppResult};
pub use info::AppInfo;
pub use lifecycle::{Runner, Service};
