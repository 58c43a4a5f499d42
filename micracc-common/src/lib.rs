//! # micracc Common Library
//!
//! Shared code for the MICR accuracy harness:
//! - Common error types
//! - Configuration loading
//! - MICR field model (ground truth, overrides, recognition outcomes)

pub mod config;
pub mod error;
pub mod micr;

pub use error::{Error, Result};

/// Identifier of one check image in the test corpus
pub type CheckId = u32;
