use std::time::Duration;

use crate::net::{MAX_WAIT_MS, MIN_WAIT_MS};
use crate::snapshot::{InterpolationConfig, InterpolationDelay};

pub const DEFAULT_RENDER_RATE: u32 = 60;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("no server address given (pass --server or set SHOOTR_SERVER)")]
    MissingServer,
    #[error("server address {0:?} must start with ws:// or wss://")]
    InvalidScheme(String),
    #[error("{name} must be a positive number")]
    NotPositive { name: &'static str },
    #[error("backoff bounds are inverted: min {min_ms} ms > max {max_ms} ms")]
    InvertedBackoff { min_ms: f64, max_ms: f64 },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub interpolation: InterpolationConfig,
    pub render_interval: Duration,
    pub connect_timeout: Duration,
    pub min_wait_ms: f64,
    pub max_wait_ms: f64,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            server_url: server_url.into(),
            interpolation: InterpolationConfig::default(),
            render_interval: Duration::from_secs_f64(1.0 / DEFAULT_RENDER_RATE as f64),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            min_wait_ms: MIN_WAIT_MS,
            max_wait_ms: MAX_WAIT_MS,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_optional(server_url: Option<String>) -> Result<Self, ConfigError> {
        match server_url {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Err(ConfigError::MissingServer),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidScheme(self.server_url.clone()));
        }

        match self.interpolation.delay {
            InterpolationDelay::Fixed {
                lerp_ratio,
                update_rate,
            } => {
                positive(lerp_ratio, "lerp ratio")?;
                if update_rate == 0 {
                    return Err(ConfigError::NotPositive {
                        name: "update rate",
                    });
                }
            }
            InterpolationDelay::Adaptive {
                buffer_ms,
                fallback_ms,
            } => {
                if !(buffer_ms.is_finite() && buffer_ms >= 0.0) {
                    return Err(ConfigError::NotPositive {
                        name: "adaptive buffer",
                    });
                }
                positive(fallback_ms, "adaptive fallback")?;
            }
        }

        if self.render_interval.is_zero() {
            return Err(ConfigError::NotPositive {
                name: "render interval",
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::NotPositive {
                name: "connect timeout",
            });
        }
        positive(self.min_wait_ms, "minimum backoff")?;
        positive(self.max_wait_ms, "maximum backoff")?;
        if self.min_wait_ms > self.max_wait_ms {
            return Err(ConfigError::InvertedBackoff {
                min_ms: self.min_wait_ms,
                max_ms: self.max_wait_ms,
            });
        }

        Ok(())
    }
}

fn positive(value: f64, name: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name })
    }
}
