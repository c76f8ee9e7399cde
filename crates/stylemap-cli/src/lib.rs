pub mod cache;
pub mod config;
pub mod error;
pub mod worker;

pub use cache::{CacheKey, CachedEnhancer, ResultCache};
pub use config::{CliConfig, Command, parse_args};
pub use error::CliError;
pub use worker::{EnhanceHandle, EnhanceWorker, WorkerError};
