//! ---
//! su_section: "01-core-functionality"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Shared primitives and utilities for the console runtime."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
//! Shared primitives for the student union console workspace: configuration
//! loading and tracing initialisation consumed by the library crates and the
//! `suctl` binary.

pub mod config;
pub mod logging;

pub use config::{ApiConfig, AppConfig, LoadedAppConfig, LoggingConfig, StorageConfig};
pub use logging::{init_tracing, LogFormat};
