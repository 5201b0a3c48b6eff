use std::env;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub stream: StreamConfig,
    pub scene: SceneConfig,
    pub logging: LoggingConfig,
}

/// Reasoning engine endpoint configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Subscription stream behavior
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Timeout for establishing the subscription connection.
    pub connect_timeout_ms: u64,
    /// Delay before a reconnect attempt after a transport failure.
    pub reconnect_delay_ms: u64,
}

/// Scene animation tuning
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Full period of the active-node pulse oscillation, in milliseconds.
    pub pulse_period_ms: u64,
    /// Pulse amplitude as a fraction of base scale.
    pub pulse_amplitude: f32,
    /// Idle auto-rotation speed, radians per second.
    pub auto_rotate_speed: f32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let engine = EngineConfig {
            base_url: env::var("ENGINE_BASE_URL").map_err(|_| AppError::Config {
                message: "ENGINE_BASE_URL is required".to_string(),
            })?,
            api_key: env::var("ENGINE_API_KEY").ok(),
        };

        let stream = StreamConfig {
            connect_timeout_ms: env::var("STREAM_CONNECT_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
            reconnect_delay_ms: env::var("STREAM_RECONNECT_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3_000),
        };

        let scene = SceneConfig {
            pulse_period_ms: env::var("SCENE_PULSE_PERIOD_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_200),
            pulse_amplitude: env::var("SCENE_PULSE_AMPLITUDE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.25),
            auto_rotate_speed: env::var("SCENE_AUTO_ROTATE_SPEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.15),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(Config {
            engine,
            stream,
            scene,
            logging,
        })
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            reconnect_delay_ms: 3_000,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            pulse_period_ms: 1_200,
            pulse_amplitude: 0.25,
            auto_rotate_speed: 0.15,
        }
    }
}
