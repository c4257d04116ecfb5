#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]

//! Layered configuration loading and named-rule validation.
//!
//! Layout: `loader.rs` (figment layers: defaults, YAML documents, env overrides),
//! `validate.rs` (rule registry, `Validate` trait, `Validated` proof wrapper), `error.rs`.

pub mod error;
pub mod loader;
pub mod validate;

pub use error::{ConfigError, ConfigResult, FieldViolation};
pub use loader::ConfigLoader;
pub use validate::{NONZERO, REQUIRED, Report, Rule, Validate, Validated, Validator};
