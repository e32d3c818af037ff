use crate::client::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};

use clap::Parser;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// gemchat - chat with Gemini, with a local calculator it can call
#[derive(Debug, Parser)]
#[command(name = "gemchat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat with Gemini from the terminal; the model can call a local calculator")]
pub struct Config {
    /// API key for the Gemini API
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// The API key, if one was given and is not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}
