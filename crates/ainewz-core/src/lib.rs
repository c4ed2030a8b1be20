pub mod config;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod verify;

pub use config::AppConfig;
pub use error::{Error, Result};
