pub mod classifier;
pub mod config;
pub mod drive;
pub mod error;
pub mod extractor;
pub mod grid;
mod http_client;
pub mod pipeline;
pub mod rows;
pub mod sheets;
pub mod store;
