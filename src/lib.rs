pub mod config;
pub mod constants;
pub mod crawlers;
pub mod dispatcher;
pub mod entity_id;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod post_filter;
pub mod processor;
pub mod types;
