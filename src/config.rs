use std::{env, fmt::Display, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub session_secret: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: String::from("sqlite://recipebook.db"),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            session_secret: String::from("secret"),
        }
    }
}

impl StoreConfig {
    /// Reads the store configuration from `RECIPEBOOK_*` environment variables.
    pub fn load() -> Self {
        let defaults = Self::default();

        let session_secret = env::var("RECIPEBOOK_SESSION_SECRET").unwrap_or_else(|_| {
            log::warn!("RECIPEBOOK_SESSION_SECRET not set, sessions are signed with the default secret");
            defaults.session_secret.to_owned()
        });

        Self {
            database_url: try_load("RECIPEBOOK_DATABASE_URL", defaults.database_url),
            max_connections: try_load("RECIPEBOOK_DB_MAX_CONNECTIONS", defaults.max_connections),
            acquire_timeout: Duration::from_secs(try_load(
                "RECIPEBOOK_DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )),
            session_secret,
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            log::warn!("Invalid {key} value ({e}), using default: {default}");
            default
        }),
        Err(_) => {
            log::info!("{key} not set, using default: {default}");
            default
        }
    }
}
