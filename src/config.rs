use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub fetch: FetchConfig,
    pub posts: PostsConfig,
}

#[derive(Debug, Deserialize)]
pub struct FetchConfig {
    pub input: String,
    pub output_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct PostsConfig {
    pub average_post_length: f64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", config_path, e))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}
