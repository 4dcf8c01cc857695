use std::env;

use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::engine::ShiftRules;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Shift policy
    pub shift_morning_start: NaiveTime,
    pub shift_evening_start: NaiveTime,
    pub shift_night_start: NaiveTime,
    pub half_day_hours: f64,
}

fn time_var(name: &str, default: &str) -> NaiveTime {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .unwrap_or_else(|_| panic!("{} must be a HH:MM time, got {:?}", name, raw))
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),
            refresh_token_ttl: env::var("REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // default 7 days
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_refresh_per_min: env::var("RATE_REFRESH_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            shift_morning_start: time_var("SHIFT_MORNING_START", "09:00"),
            shift_evening_start: time_var("SHIFT_EVENING_START", "17:00"),
            shift_night_start: time_var("SHIFT_NIGHT_START", "21:00"),
            half_day_hours: env::var("HALF_DAY_HOURS")
                .unwrap_or_else(|_| "4.0".to_string())
                .parse()
                .unwrap(),
        }
    }

    /// Attendance policy knobs in the shape the engine consumes.
    pub fn shift_rules(&self) -> ShiftRules {
        ShiftRules {
            morning_start: self.shift_morning_start,
            evening_start: self.shift_evening_start,
            night_start: self.shift_night_start,
            half_day_hours: self.half_day_hours,
        }
    }
}
