use anyhow::Context;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001,http://localhost:3002";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// How user passwords are written at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    Plaintext,
    Argon2,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub cors_allowed_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub password_scheme: PasswordScheme,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = match var("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => anyhow::bail!("unknown STORE_BACKEND {other:?} (expected postgres or memory)"),
        };
        let database_url = var("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }

        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "gymdesk".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "gymdesk-staff".into()),
            ttl_minutes: parse_or(var("JWT_TTL_MINUTES"), 12 * 60),
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();

        let rate_limit = RateLimitConfig {
            max_requests: parse_or(var("RATE_LIMIT_MAX"), 100),
            window_secs: parse_or(var("RATE_LIMIT_WINDOW_SECS"), 15 * 60),
        };

        let password_scheme = match var("PASSWORD_SCHEME").as_deref() {
            None | Some("plaintext") => PasswordScheme::Plaintext,
            Some("argon2") => PasswordScheme::Argon2,
            Some(other) => anyhow::bail!("unknown PASSWORD_SCHEME {other:?} (expected plaintext or argon2)"),
        };

        Ok(Self {
            store,
            database_url,
            jwt,
            cors_allowed_origins,
            rate_limit,
            password_scheme,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(var("APP_PORT"), 5001),
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}
