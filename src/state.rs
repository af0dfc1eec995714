use std::sync::Arc;

use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, PasswordScheme, StoreBackend};
use crate::rate_limit::RateLimiter;
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub jwt: JwtKeys,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = match (config.store, config.database_url.as_deref()) {
            (StoreBackend::Postgres, Some(url)) => {
                let store = PgDocumentStore::connect(url).await?;
                store.migrate().await?;
                Arc::new(store) as Arc<dyn DocumentStore>
            }
            (StoreBackend::Postgres, None) => {
                anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres")
            }
            (StoreBackend::Memory, _) => {
                warn!("using the in-memory document store; data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
            }
        };

        if config.password_scheme == PasswordScheme::Plaintext {
            warn!("PASSWORD_SCHEME=plaintext: user passwords are stored and compared unhashed");
        }

        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            jwt: JwtKeys::new(&config.jwt),
            limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            config: Arc::new(config),
            store,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::for_tests_with(|_| {})
    }

    #[cfg(test)]
    pub fn for_tests_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        use crate::config::{JwtConfig, RateLimitConfig};

        let mut config = AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 12 * 60,
            },
            cors_allowed_origins: vec!["http://localhost:3000".into()],
            rate_limit: RateLimitConfig {
                max_requests: 10_000,
                window_secs: 60,
            },
            password_scheme: PasswordScheme::Plaintext,
            host: "127.0.0.1".into(),
            port: 0,
        };
        tweak(&mut config);
        Self::from_parts(config, Arc::new(MemoryStore::new()))
    }
}
