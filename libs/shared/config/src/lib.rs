use std::env;

use chrono::NaiveTime;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub operating_day_start: NaiveTime,
    pub operating_day_end: NaiveTime,
    pub realtime_channel_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("API_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| {
                warn!("API_PORT not set or invalid, defaulting to 3000");
                3000
            });

        let operating_day_start = parse_time_var("OPERATING_DAY_START", "08:00");
        let operating_day_end = parse_time_var("OPERATING_DAY_END", "20:00");

        let realtime_channel_capacity = env::var("REALTIME_CHANNEL_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| {
                warn!("REALTIME_CHANNEL_CAPACITY not set or invalid, defaulting to 256");
                256
            });

        let config = Self {
            port,
            operating_day_start,
            operating_day_end,
            realtime_channel_capacity,
        };

        if config.operating_day_start >= config.operating_day_end {
            warn!("Operating day start is not before end - availability queries will be empty");
        }

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            operating_day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            operating_day_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            realtime_channel_capacity: 256,
        }
    }
}

fn parse_time_var(name: &str, default: &str) -> NaiveTime {
    let raw = env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, defaulting to {}", name, default);
        default.to_string()
    });

    NaiveTime::parse_from_str(&raw, "%H:%M").unwrap_or_else(|_| {
        warn!("{} is not a valid HH:MM time, defaulting to {}", name, default);
        NaiveTime::parse_from_str(default, "%H:%M").expect("default time is valid")
    })
}
