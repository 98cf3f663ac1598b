pub mod cache;
pub mod config;
pub mod error;
pub mod interval;
pub mod remote;
pub mod sources;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
