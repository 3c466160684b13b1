pub mod config;
pub mod consts;
pub mod crawler;
pub mod databundle;
pub mod errors;
pub mod fetch;
pub mod filter;
pub mod limiter;
pub mod ns;
pub mod options;
pub mod populate;
pub mod store;
pub mod util;

pub use crate::crawler::Crawler;
pub use crate::errors::CacheError;
pub use crate::store::{Resource, ResourceStore};
