//! Command-line inspector for S3D archives and WLD streams.
//!
//! The library holds the command implementations so they can be tested
//! without spawning the binary:
//! - `config`: CLI and environment configuration, with validation
//! - `commands`: listing, extraction, fragment dumps, texture and zone reports
//! - `error`: error types
//!
//! # Example
//!
//! ```no_run
//! use zeq_inspect::{InspectConfig, commands};
//!
//! let config = InspectConfig::from_args();
//! config.validate()?;
//! commands::run(&config, &mut std::io::stdout().lock())?;
//! # Ok::<(), zeq_inspect::InspectError>(())
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod error;

pub use config::{Command, InspectConfig};
pub use error::{ConfigError, InspectError};
