//! Process configuration, read once at startup.

use std::net::SocketAddr;

use clap::Parser;

use crate::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::preprocess::Preprocessing;

/// Visionary AI: image analysis powered by Gemini
#[derive(Parser, Debug, Clone)]
#[command(name = "visionary-ai", version, about)]
pub struct Config {
    /// Address the web server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Gemini API key (falls back to GEMINI_API_KEY)
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model used for every analysis
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the Generative Language API
    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Send images without the contrast enhancement step
    #[arg(long, env = "DISABLE_CONTRAST_ENHANCEMENT")]
    pub no_enhance: bool,

    /// Maximum request body size in MiB
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 25)]
    pub max_upload_mb: usize,
}

impl Config {
    /// Parse from the command line and environment.
    pub fn load() -> Self {
        Self::parse().with_key_fallback(std::env::var("GEMINI_API_KEY").ok())
    }

    fn with_key_fallback(mut self, fallback: Option<String>) -> Self {
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            self.api_key = fallback.filter(|k| !k.is_empty());
        }
        self
    }

    pub fn preprocessing(&self) -> Preprocessing {
        if self.no_enhance {
            Preprocessing::None
        } else {
            Preprocessing::Contrast
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["visionary-ai", "--api-key", "k"]).unwrap();

        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.preprocessing(), Preprocessing::Contrast);
        assert_eq!(config.max_upload_bytes(), 25 * 1024 * 1024);
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "visionary-ai",
            "--api-key",
            "k",
            "--no-enhance",
            "--model",
            "gemini-1.5-pro",
            "--bind",
            "127.0.0.1:8080",
        ])
        .unwrap();

        assert_eq!(config.preprocessing(), Preprocessing::None);
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_key_fallback() {
        let config = Config::try_parse_from(["visionary-ai", "--api-key", ""])
            .unwrap()
            .with_key_fallback(Some("from-gemini-env".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("from-gemini-env"));

        let config = Config::try_parse_from(["visionary-ai", "--api-key", "primary"])
            .unwrap()
            .with_key_fallback(Some("from-gemini-env".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }
}
