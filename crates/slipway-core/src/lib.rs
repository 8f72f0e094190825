//! Core library for slipway.
//!
//! Everything the `slipway` CLI does — version arithmetic, descriptor
//! rewriting, readiness checks, and the release queue — lives here, so other
//! tooling can drive the same operations without going through the CLI.
//!
//! # Modules
//!
//! - [`version`] - The version value type and its transitions
//! - [`descriptor`] - Descriptor files and version rewriting
//! - [`readiness`] - Release readiness checks
//! - [`release`] - Release sequencing and execution
//! - [`scm`] - Source-control operations for release workflows
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use slipway_core::Version;
//!
//! let version = Version::parse("1.4.2-SNAPSHOT");
//! assert!(version.is_snapshot());
//! assert_eq!(version.to_stable().to_string(), "1.4.2");
//! ```
#![deny(unsafe_code)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod readiness;
pub mod release;
pub mod scm;
pub mod version;

pub use config::{Config, ConfigLoader, LogLevel};
pub use error::{ConfigError, ConfigResult};
pub use version::{BumpLevel, Version};
