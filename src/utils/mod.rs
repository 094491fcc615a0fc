//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod crypto;
pub mod logging;
pub mod settings;

pub use crypto::*;
pub use settings::*;
