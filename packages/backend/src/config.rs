use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use gateprep_algo::ScoringConfig;

use crate::engine::EngineConfig;
use crate::logging::LoggingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBackend {
    Memory,
    File,
    Sqlite,
    Postgres,
}

impl StateBackend {
    /// Postgres when `DATABASE_URL` is set, per-user JSON files otherwise.
    pub fn detect() -> Self {
        match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => StateBackend::Postgres,
            _ => StateBackend::File,
        }
    }
}

impl FromStr for StateBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown state backend: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub logging: LoggingConfig,
    pub catalog_path: PathBuf,
    pub question_bank_path: PathBuf,
    pub state_backend: StateBackend,
    pub state_dir: PathBuf,
    pub database_url: Option<String>,
    pub sqlite_path: Option<PathBuf>,
    pub engine: EngineConfig,
    pub mock_questions_per_subject: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let state_backend = std::env::var("STATE_BACKEND")
            .ok()
            .and_then(|value| value.parse::<StateBackend>().ok())
            .unwrap_or_else(StateBackend::detect);

        let mut scoring = ScoringConfig::default();
        if let Some(alpha) = env_f64("ADAPTIVE_ALPHA").filter(|v| *v > 0.0 && *v <= 1.0) {
            scoring.alpha = alpha;
        }
        if let Some(threshold) = env_f64("ADAPTIVE_THRESHOLD").filter(|v| (0.0..=1.0).contains(v)) {
            scoring.threshold = threshold;
        }

        Self {
            host,
            port,
            logging: LoggingConfig::from_env(),
            catalog_path: env_path("CATALOG_PATH", "data/raw/topics.json"),
            question_bank_path: env_path("QUESTION_BANK_PATH", "data/questions.json"),
            state_backend,
            state_dir: env_path("STATE_DIR", "data/adaptive_state"),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            sqlite_path: std::env::var("SQLITE_PATH").ok().map(PathBuf::from),
            engine: EngineConfig {
                scoring,
                ..EngineConfig::default()
            },
            mock_questions_per_subject: std::env::var("MOCK_QUESTIONS_PER_SUBJECT")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(5),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|value| value.parse::<f64>().ok())
}
