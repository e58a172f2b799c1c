//! Core utilities: types, errors, logging, configuration

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::SculptConfig;
pub use error::Error;
