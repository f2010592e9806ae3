pub mod agent;
pub mod batch;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod storage;

pub use error::{Error, Result};
