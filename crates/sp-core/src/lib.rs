//! # sp-core
//!
//! Configuration and error handling shared by the service provider crates.
//!
//! Every tunable of the SP lives in [`SpConfig`]: the SP's own endpoints,
//! the trusted IdP, the signature policy and the store lifetimes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;

pub use config::SpConfig;
pub use error::{ConfigError, ConfigResult};
