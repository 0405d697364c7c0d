use std::{net::SocketAddr, time::Duration};

use clap::Parser;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TRAVEL_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_TTS_VOICE: &str = "Kore";

/// Startup configuration; every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "travel-backend", about = "Proxy between the travel assistant and Gemini")]
pub struct Config {
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, env = "TRAVEL_MODEL", default_value = DEFAULT_TRAVEL_MODEL)]
    pub travel_model: String,

    #[arg(long, env = "TTS_MODEL", default_value = DEFAULT_TTS_MODEL)]
    pub tts_model: String,

    #[arg(long, env = "TTS_VOICE", default_value = DEFAULT_TTS_VOICE)]
    pub tts_voice: String,

    #[arg(long = "bind", env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Model selection for the two services, split out of [`Config`] so tests
/// can build application state without a full command line.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub travel_model: String,
    pub tts_model: String,
    pub tts_voice: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            travel_model: DEFAULT_TRAVEL_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
        }
    }
}

impl From<&Config> for ModelSettings {
    fn from(config: &Config) -> Self {
        Self {
            travel_model: config.travel_model.clone(),
            tts_model: config.tts_model.clone(),
            tts_voice: config.tts_voice.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn declared_default(id: &str) -> String {
        let command = Config::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .unwrap_or_else(|| panic!("no argument {id}"));
        arg.get_default_values()[0].to_string_lossy().into_owned()
    }

    // Declared defaults only; parsing would pick up the shell's environment.
    #[test]
    fn declared_defaults() {
        assert_eq!(declared_default("api_base"), DEFAULT_API_BASE);
        assert_eq!(declared_default("travel_model"), DEFAULT_TRAVEL_MODEL);
        assert_eq!(declared_default("tts_model"), DEFAULT_TTS_MODEL);
        assert_eq!(declared_default("tts_voice"), "Kore");
        assert_eq!(declared_default("bind_addr"), "0.0.0.0:8080");
        assert_eq!(declared_default("request_timeout_secs"), "60");
    }

    #[test]
    fn api_key_has_no_default() {
        let command = Config::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "api_key")
            .unwrap();
        assert!(arg.get_default_values().is_empty());
        assert_eq!(arg.get_env().and_then(|env| env.to_str()), Some("GEMINI_API_KEY"));
    }

    #[test]
    fn request_timeout_converts_seconds() {
        let config = Config::try_parse_from([
            "travel-backend",
            "--api-key",
            "secret",
            "--request-timeout-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "travel-backend",
            "--api-key",
            "secret",
            "--travel-model",
            "gemini-2.5-flash",
            "--bind",
            "127.0.0.1:9000",
        ])
        .unwrap();
        let models = ModelSettings::from(&config);
        assert_eq!(models.travel_model, "gemini-2.5-flash");
        assert_eq!(config.bind_addr.port(), 9000);
    }
}
