//! RepForge Core — error taxonomy, configuration, data model.

pub mod config;
pub mod error;
pub mod exercise;
pub mod plan;
pub mod profile;

pub use config::{DataPaths, RepForgeConfig};
pub use error::{Error, Result};
pub use exercise::*;
pub use plan::*;
pub use profile::*;
