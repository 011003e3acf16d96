use std::env;
use std::str::FromStr;
use crate::domain::services::cooldown::DEFAULT_COOLDOWN_SECS;
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct RsvpSettings {
    pub cooldown_secs: i64,
    pub max_tx_attempts: u32,
    pub retry_base_ms: u64,
}

impl Default for RsvpSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            max_tx_attempts: 3,
            retry_base_ms: 20,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String, // HS256 secret shared with the identity service
    pub auth_audience: String,
    pub rsvp: RsvpSettings,
}

fn required(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{} must be set", name)))
}

fn parsed<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse()
            .map_err(|_| AppError::Validation(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = RsvpSettings::default();

        let rsvp = RsvpSettings {
            cooldown_secs: parsed("RSVP_COOLDOWN_SECS", defaults.cooldown_secs)?,
            max_tx_attempts: parsed("RSVP_MAX_TX_ATTEMPTS", defaults.max_tx_attempts)?,
            retry_base_ms: parsed("RSVP_RETRY_BASE_MS", defaults.retry_base_ms)?,
        };

        if rsvp.cooldown_secs < 0 {
            return Err(AppError::Validation("RSVP_COOLDOWN_SECS must not be negative".into()));
        }
        if rsvp.max_tx_attempts == 0 {
            return Err(AppError::Validation("RSVP_MAX_TX_ATTEMPTS must be at least 1".into()));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port: parsed("PORT", 3000)?,
            jwt_secret: required("JWT_SECRET")?,
            auth_audience: env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "rsvp-frontend".to_string()),
            rsvp,
        })
    }
}
