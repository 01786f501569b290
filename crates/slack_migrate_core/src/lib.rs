pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod emoji;
pub mod enrich;
pub mod error;
pub mod export;
pub mod fetch;
pub mod filters;
pub mod mutate;
pub mod types;
