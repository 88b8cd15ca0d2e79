use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub task_queue_size: usize,
    pub event_buffer_size: usize,
    pub payment_webhook_secret: String,
    pub ping_cooldown: Duration,
    pub store_utc_offset_minutes: i32,
    pub notification_icon: String,
    pub order_tracking_url: String,
    pub vapid_public_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            task_queue_size: 1024,
            event_buffer_size: 1024,
            payment_webhook_secret: String::new(),
            ping_cooldown: Duration::from_secs(180),
            store_utc_offset_minutes: 0,
            notification_icon: "/icon-192x192.png".to_string(),
            order_tracking_url: "/orders".to_string(),
            vapid_public_key: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {other}, expected compact/json"
                )));
            }
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            task_queue_size: parse_or_default("TASK_QUEUE_SIZE", defaults.task_queue_size)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),
            ping_cooldown: Duration::from_secs(parse_or_default("PING_COOLDOWN_SECS", 180u64)?),
            store_utc_offset_minutes: parse_or_default(
                "STORE_UTC_OFFSET_MINUTES",
                defaults.store_utc_offset_minutes,
            )?,
            notification_icon: env::var("NOTIFICATION_ICON").unwrap_or(defaults.notification_icon),
            order_tracking_url: env::var("ORDER_TRACKING_URL")
                .unwrap_or(defaults.order_tracking_url),
            vapid_public_key: env::var("VAPID_PUBLIC_KEY").unwrap_or_default(),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
