use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// File backing the local store; `None` keeps everything in memory
    pub store_path: Option<PathBuf>,
    /// Simulated wait between a ride request and the rider accepting it
    pub allocation_delay: Duration,
    pub help_reply_delay: Duration,
    pub login_code_cooldown_secs: i64,
    /// Wrong-or-right guesses allowed per minute on each code endpoint
    pub code_attempts_per_minute: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            store_path: None,
            allocation_delay: Duration::from_millis(1800),
            help_reply_delay: Duration::from_millis(400),
            login_code_cooldown_secs: 30,
            code_attempts_per_minute: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let store_path = env::var("STORE_PATH")
            .unwrap_or_else(|_| "ridelink-store.json".to_string());

        Self {
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            store_path: if store_path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(store_path))
            },
            allocation_delay: Duration::from_millis(
                env::var("ALLOCATION_DELAY_MS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .expect("ALLOCATION_DELAY_MS must be a number"),
            ),
            help_reply_delay: Duration::from_millis(
                env::var("HELP_REPLY_DELAY_MS")
                    .unwrap_or_else(|_| "400".to_string())
                    .parse()
                    .expect("HELP_REPLY_DELAY_MS must be a number"),
            ),
            login_code_cooldown_secs: env::var("LOGIN_CODE_COOLDOWN_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("LOGIN_CODE_COOLDOWN_SECS must be a number"),
            code_attempts_per_minute: env::var("CODE_ATTEMPTS_PER_MINUTE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("CODE_ATTEMPTS_PER_MINUTE must be a number"),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
