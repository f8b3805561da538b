use std::env;
use std::fs::File;
use std::str::FromStr;

use dotenv::dotenv;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};

#[derive(Clone)]
pub struct Config {
    pub log_level: LevelFilter,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::Info,
            log_file: "counsel_messaging.log".into(),
        }
    }
}

impl Config {
    /// Reads the configuration from the environment. `None` when `RUST_LOG`
    /// is absent or not a valid level; callers fall back with
    /// `unwrap_or_default()`.
    pub fn env() -> Option<Self> {
        dotenv().ok();

        let log_level = LevelFilter::from_str(&env::var("RUST_LOG").ok()?).ok()?;
        let log_file = env::var("SERVICE_NAME")
            .map(|pkg| format!("{pkg}.log"))
            .unwrap_or("counsel_messaging.log".into());

        Some(Self {
            log_level,
            log_file,
        })
    }

    /// Installs the combined terminal + file logger. Called once at startup.
    pub fn init_logger(&self) {
        CombinedLogger::init(vec![
            TermLogger::new(
                self.log_level,
                simplelog::Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            ),
            WriteLogger::new(
                self.log_level,
                simplelog::Config::default(),
                File::create(&self.log_file).expect("Failed to create log file"),
            ),
        ])
        .expect("Failed to initialize logger");
    }
}
