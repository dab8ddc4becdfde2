/*
 * Responsibility
 * - 環境変数や設定の読み込み (鍵ファイルのパス、CORS 許可、リプレイ対策など)
 * - 設定値のバリデーション (不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,

    /// Scheme + host the service is reachable at, e.g. `https://api.example.com`.
    pub public_base_url: Option<String>,

    pub replay_protection: bool,
    pub valkey_url: Option<String>,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; unset and empty values are the same.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match get("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let private_key_path = get("DPOP_PRIVATE_KEY_PATH")
            .unwrap_or_else(|| "keys/private.pem".to_string())
            .into();
        let public_key_path = get("DPOP_PUBLIC_KEY_PATH")
            .unwrap_or_else(|| "keys/public.pem".to_string())
            .into();

        let public_base_url = match get("PUBLIC_BASE_URL") {
            Some(raw) => Some(normalize_base_url(&raw)?),
            None => None,
        };

        let replay_protection = match get("DPOP_REPLAY_PROTECTION") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid("DPOP_REPLAY_PROTECTION"))?,
            None => true,
        };
        let valkey_url = get("VALKEY_URL");

        let request_timeout = match get("REQUEST_TIMEOUT_SECONDS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?,
            ),
            None => Duration::from_secs(30),
        };

        let request_body_limit_bytes = match get("REQUEST_BODY_LIMIT_BYTES") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid("REQUEST_BODY_LIMIT_BYTES"))?,
            None => 1024 * 1024,
        };

        if app_env.is_production() && cors_allowed_origins.is_empty() {
            return Err(ConfigError::Missing("CORS_ALLOWED_ORIGINS"));
        }

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            private_key_path,
            public_key_path,
            public_base_url,
            replay_protection,
            valkey_url,
            request_timeout,
            request_body_limit_bytes,
        })
    }
}

// Keep scheme://host[:port] only; a path or query here would corrupt `htu`.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid("PUBLIC_BASE_URL"))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid("PUBLIC_BASE_URL"));
    }
    Ok(url.origin().ascii_serialization())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
